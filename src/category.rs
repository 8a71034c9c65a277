//! Animal categories and where the API keeps their data.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::Error;

/// Default host serving the `/animal/*` endpoints.
pub const DEFAULT_API_BASE: &str = "https://some-random-api.com";

/// Where a category lives on the API and which JSON fields hold its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    pub name: &'static str,
    /// Relative to the API base URL.
    pub path: &'static str,
    pub image_field: &'static str,
    pub fact_field: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Pandas,
    Dogs,
    Cats,
    Birds,
    Foxes,
    RedPandas,
    Kangaroo,
    Koala,
    Raccoon,
}

const fn spec(name: &'static str, path: &'static str) -> CategorySpec {
    CategorySpec {
        name,
        path,
        image_field: "image",
        fact_field: "fact",
    }
}

const PANDAS: CategorySpec = spec("pandas", "animal/panda");
const DOGS: CategorySpec = spec("dogs", "animal/dog");
const CATS: CategorySpec = spec("cats", "animal/cat");
const BIRDS: CategorySpec = spec("birds", "animal/birb");
const FOXES: CategorySpec = spec("foxes", "animal/fox");
const RED_PANDAS: CategorySpec = spec("redpandas", "animal/red_panda");
const KANGAROO: CategorySpec = spec("kangaroo", "animal/kangaroo");
const KOALA: CategorySpec = spec("koala", "animal/koala");
const RACCOON: CategorySpec = spec("raccoon", "animal/raccoon");

impl Category {
    const ALL: [Category; 9] = [
        Category::Pandas,
        Category::Dogs,
        Category::Cats,
        Category::Birds,
        Category::Foxes,
        Category::RedPandas,
        Category::Kangaroo,
        Category::Koala,
        Category::Raccoon,
    ];

    /// Every category, in display order.
    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn spec(&self) -> &'static CategorySpec {
        match self {
            Category::Pandas => &PANDAS,
            Category::Dogs => &DOGS,
            Category::Cats => &CATS,
            Category::Birds => &BIRDS,
            Category::Foxes => &FOXES,
            Category::RedPandas => &RED_PANDAS,
            Category::Kangaroo => &KANGAROO,
            Category::Koala => &KOALA,
            Category::Raccoon => &RACCOON,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Resolve this category's endpoint below `base`, keeping any path prefix.
    pub fn endpoint(&self, base: &Url) -> Result<Url, Error> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        base.join(self.spec().path)
            .map_err(|e| Error::Config(format!("invalid API base URL '{}': {}", base, e)))
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Category::name).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}
