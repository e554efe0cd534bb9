use std::{collections::BTreeMap, sync::Arc};

use ahash::AHashMap;

use crate::error::{Error, Result};

/// An atomic spatial unit, identified by a stable string code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub code: Arc<str>,
    pub parent: Option<Arc<str>>, // Administrative group (e.g. district)
    pub kind: Option<Arc<str>>,   // Type tag
}

impl Region {
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Self { code: code.into(), parent: None, kind: None }
    }

    pub fn with_parent(mut self, parent: impl Into<Arc<str>>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<Arc<str>>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Fixed set of regions for one analysis run, with a dense `0..n` index.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: Vec<Region>,
    index: AHashMap<Arc<str>, u32>,
}

impl RegionIndex {
    pub fn new() -> Self { Self::default() }

    /// Build an index from bare codes, in iteration order.
    pub fn from_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let mut index = Self::new();
        for code in codes { index.push(Region::new(code))?; }
        Ok(index)
    }

    /// Append a region, returning its dense index.
    pub fn push(&mut self, region: Region) -> Result<u32> {
        if self.index.contains_key(&region.code) {
            return Err(Error::IdentifierCollision {
                scenario: "regions".into(),
                keys: vec![region.code.to_string()],
            });
        }
        let i = self.regions.len() as u32;
        self.index.insert(region.code.clone(), i);
        self.regions.push(region);
        Ok(i)
    }

    #[inline] pub fn len(&self) -> usize { self.regions.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    #[inline] pub fn get(&self, code: &str) -> Option<u32> { self.index.get(code).copied() }

    /// Like `get`, but unknown codes are an error.
    pub fn require(&self, code: &str) -> Result<u32> {
        self.get(code).ok_or_else(|| Error::UnknownRegion(code.to_string()))
    }

    #[inline] pub fn region(&self, i: u32) -> &Region { &self.regions[i as usize] }

    #[inline] pub fn code(&self, i: u32) -> &str { &self.regions[i as usize].code }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ { self.regions.iter() }

    /// Attach (or replace) the administrative parent of a region.
    pub fn set_parent(&mut self, i: u32, parent: impl Into<Arc<str>>) {
        self.regions[i as usize].parent = Some(parent.into());
    }

    /// Member regions of each administrative group, in index order.
    /// Regions without a parent are left out.
    pub fn groups(&self) -> BTreeMap<Arc<str>, Vec<u32>> {
        self.regions.iter().enumerate()
            .filter_map(|(i, r)| r.parent.clone().map(|p| (p, i as u32)))
            .fold(BTreeMap::new(), |mut acc, (parent, i)| {
                acc.entry(parent).or_insert_with(Vec::new).push(i);
                acc
            })
    }
}
