use crate::error::{Error, Result};
use crate::graph::DistanceTable;
use crate::types::{ObservationTable, RegionIndex};

/// A named set of regions on one side of a fairness comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedGroup {
    name: String,
    regions: Vec<u32>, // sorted, deduplicated
}

impl ProtectedGroup {
    pub fn new(name: impl Into<String>, mut regions: Vec<u32>) -> Self {
        regions.sort_unstable();
        regions.dedup();
        Self { name: name.into(), regions }
    }

    /// Regions within `radius` hops of `center` (center included), named `ring_{radius}`.
    pub fn ring(table: &DistanceTable, center: usize, radius: u32) -> Self {
        Self::new(format!("ring_{radius}"), table.ring(center, radius))
    }

    /// One group per administrative parent, named after the parent code.
    pub fn by_parent(index: &RegionIndex) -> Vec<Self> {
        index.groups().into_iter()
            .map(|(parent, regions)| Self::new(parent.to_string(), regions))
            .collect()
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn regions(&self) -> &[u32] { &self.regions }

    #[inline] pub fn contains(&self, region: u32) -> bool { self.regions.binary_search(&region).is_ok() }

    /// Per-observation membership flag.
    pub fn indicator(&self, table: &ObservationTable) -> Vec<bool> {
        table.iter().map(|o| self.contains(o.region)).collect()
    }
}

/// Per-observation group labels: `Some(g)` for members of group `g`,
/// `None` for observations that only count toward the population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLabels {
    labels: Vec<Option<usize>>,
    num_groups: usize,
}

impl GroupLabels {
    pub fn new(labels: Vec<Option<usize>>, num_groups: usize) -> Result<Self> {
        if let Some(&g) = labels.iter().flatten().find(|&&g| g >= num_groups) {
            return Err(Error::InvalidConfig(format!("group label {g} outside 0..{num_groups}")));
        }
        Ok(Self { labels, num_groups })
    }

    /// A single protected group: members labelled 0, everyone else unlabelled.
    pub fn from_mask(mask: &[bool]) -> Self {
        Self { labels: mask.iter().map(|&m| m.then_some(0)).collect(), num_groups: 1 }
    }

    /// Both sides of a binary split: non-members labelled 0, members 1.
    pub fn binary(mask: &[bool]) -> Self {
        Self { labels: mask.iter().map(|&m| Some(m as usize)).collect(), num_groups: 2 }
    }

    #[inline] pub fn len(&self) -> usize { self.labels.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    #[inline] pub fn num_groups(&self) -> usize { self.num_groups }

    #[inline] pub fn labels(&self) -> &[Option<usize>] { &self.labels }

    /// Number of labelled observations per group.
    pub fn sizes(&self) -> Vec<usize> {
        self.labels.iter().flatten().fold(vec![0; self.num_groups], |mut acc, &g| { acc[g] += 1; acc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;
    use crate::types::{Observation, Region};

    #[test]
    fn rings_grow_with_radius() {
        let graph = AdjacencyGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let table = DistanceTable::build(&graph, 4).unwrap();
        assert_eq!(ProtectedGroup::ring(&table, 2, 0).regions(), &[2]);
        assert_eq!(ProtectedGroup::ring(&table, 2, 1).regions(), &[1, 2, 3]);
        assert_eq!(ProtectedGroup::ring(&table, 0, 2).regions(), &[0, 1, 2]);
        assert_eq!(ProtectedGroup::ring(&table, 0, 2).name(), "ring_2");
    }

    #[test]
    fn parent_groups_follow_index() {
        let mut index = RegionIndex::new();
        index.push(Region::new("a").with_parent("d1")).unwrap();
        index.push(Region::new("b").with_parent("d2")).unwrap();
        index.push(Region::new("c").with_parent("d1")).unwrap();
        let groups = ProtectedGroup::by_parent(&index);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name(), "d1");
        assert_eq!(groups[0].regions(), &[0, 2]);
    }

    #[test]
    fn indicator_marks_member_rows() {
        let obs = |region| Observation { id: "x".into(), region, observed: 1.0, predicted: 1.0, group: None, income: None };
        let table = ObservationTable::new(vec![obs(0), obs(3), obs(1), obs(3)]);
        let group = ProtectedGroup::new("g", vec![3, 1, 3]);
        assert_eq!(group.regions(), &[1, 3]);
        assert_eq!(group.indicator(&table), vec![false, true, true, true]);
    }

    #[test]
    fn label_constructors() {
        let mask = [true, false, true];
        assert_eq!(GroupLabels::from_mask(&mask).labels(), &[Some(0), None, Some(0)]);
        assert_eq!(GroupLabels::binary(&mask).labels(), &[Some(1), Some(0), Some(1)]);
        assert_eq!(GroupLabels::binary(&mask).sizes(), vec![1, 2]);
        assert_eq!(GroupLabels::new(vec![Some(1), None], 2).unwrap().sizes(), vec![0, 1]);
        assert!(matches!(GroupLabels::new(vec![Some(2)], 2), Err(Error::InvalidConfig(_))));
    }
}
