//! Hazard analysis over registered passes.
//!
//! Passes are grouped in registration order: a pass joins the open group
//! unless it has a read-after-write, write-after-write or write-after-read
//! dependency on a pass already in it. Groups never reorder passes, so
//! concatenating them reproduces the registration order.
//!
//! ```text
//! pass 0: writes X          group 0: [0, 1]
//! pass 1: writes Y
//! pass 2: reads X, writes Z group 1: [2, 3]
//! pass 3: reads Y
//! pass 4: reads Z           group 2: [4]
//! ```

use std::collections::{HashMap, HashSet};

use redlilium_core::pool::Poolable;

use super::{PassDescriptor, PassHandle};
use crate::resources::ResourceId;

/// Deduplicated read and write sets of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassResourceAccess {
    pub pass: Option<PassHandle>,
    pub reads: HashSet<ResourceId>,
    pub writes: HashSet<ResourceId>,
}

impl PassResourceAccess {
    /// Access sets of `descriptor`: raw accesses plus binding-implied ones.
    pub fn from_descriptor(pass: PassHandle, descriptor: &PassDescriptor) -> Self {
        let mut access = Self {
            pass: Some(pass),
            ..Default::default()
        };

        access.reads.extend(descriptor.raw_reads().iter().copied());
        access.writes.extend(descriptor.raw_writes().iter().copied());
        for set in descriptor.bindings() {
            access.reads.extend(set.reads());
            access.writes.extend(set.writes());
        }

        access
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}

/// Passes that may be recorded concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassGroup {
    pub passes: Vec<PassHandle>,
}

impl PassGroup {
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// Lifetime hints for one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    /// Last pass reading the resource.
    pub last_reader: Option<PassHandle>,
    /// First pass writing the resource.
    pub first_writer: Option<PassHandle>,
}

/// Whether `later` must wait for `earlier`.
pub fn has_dependency(earlier: &PassResourceAccess, later: &PassResourceAccess) -> bool {
    !earlier.writes.is_disjoint(&later.reads)
        || !earlier.writes.is_disjoint(&later.writes)
        || !earlier.reads.is_disjoint(&later.writes)
}

/// For every pass, the earlier passes it depends on (ascending).
pub fn build_dependency_graph(accesses: &[PassResourceAccess]) -> Vec<Vec<usize>> {
    let mut dependencies = Vec::with_capacity(accesses.len());
    build_dependency_graph_into(accesses, &mut dependencies);
    dependencies
}

fn build_dependency_graph_into(
    accesses: &[PassResourceAccess],
    dependencies: &mut Vec<Vec<usize>>,
) {
    dependencies.truncate(accesses.len());
    dependencies.resize_with(accesses.len(), Vec::new);

    for (later, edges) in dependencies.iter_mut().enumerate() {
        edges.clear();
        if accesses[later].is_empty() {
            continue;
        }
        edges.extend(
            (0..later).filter(|&earlier| has_dependency(&accesses[earlier], &accesses[later])),
        );
    }
}

/// Split passes into ordered groups, starting a new group whenever a pass
/// depends on a member of the open one.
pub fn group_passes(dependencies: &[Vec<usize>]) -> Vec<PassGroup> {
    let mut groups = Vec::new();
    group_passes_into(dependencies, &mut groups);
    groups
}

fn group_passes_into(dependencies: &[Vec<usize>], groups: &mut Vec<PassGroup>) {
    groups.clear();
    let mut group_start = 0;

    for (pass, edges) in dependencies.iter().enumerate() {
        let conflicts = edges.iter().any(|&earlier| earlier >= group_start);
        if conflicts || groups.is_empty() {
            group_start = pass;
            groups.push(PassGroup::default());
        }
        if let Some(group) = groups.last_mut() {
            group.passes.push(PassHandle::new(pass));
        }
    }
}

/// Size of the largest group.
pub fn highest_parallel_group_count(groups: &[PassGroup]) -> usize {
    groups.iter().map(PassGroup::len).max().unwrap_or(0)
}

/// Last reader and first writer of every accessed resource.
pub fn analyze_last_resource_usages(
    accesses: &[PassResourceAccess],
) -> HashMap<ResourceId, ResourceUsage> {
    let mut usages: HashMap<ResourceId, ResourceUsage> = HashMap::new();

    for (index, access) in accesses.iter().enumerate() {
        let pass = access.pass.unwrap_or(PassHandle::new(index));
        for resource in &access.reads {
            usages.entry(*resource).or_default().last_reader = Some(pass);
        }
        for resource in &access.writes {
            usages
                .entry(*resource)
                .or_default()
                .first_writer
                .get_or_insert(pass);
        }
    }

    usages
}

/// Result of analyzing one frame's passes.
#[derive(Debug, Default)]
pub struct ParallelAnalysis {
    pub groups: Vec<PassGroup>,
    pub highest_parallel_group_count: usize,
    pub resource_usages: HashMap<ResourceId, ResourceUsage>,
}

impl Poolable for ParallelAnalysis {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.groups.clear();
        self.highest_parallel_group_count = 0;
        self.resource_usages.clear();
    }
}

/// Reusable analyzer keeping its scratch buffers across frames.
#[derive(Debug, Default)]
pub struct PassAnalyzer {
    accesses: Vec<PassResourceAccess>,
    dependencies: Vec<Vec<usize>>,
}

impl PassAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute access sets for every pass in registration order.
    pub fn analyze_pass_resources<'a>(
        &mut self,
        descriptors: impl IntoIterator<Item = &'a PassDescriptor>,
    ) -> &[PassResourceAccess] {
        self.accesses.clear();
        self.accesses.extend(
            descriptors
                .into_iter()
                .enumerate()
                .map(|(index, descriptor)| {
                    PassResourceAccess::from_descriptor(PassHandle::new(index), descriptor)
                }),
        );
        &self.accesses
    }

    /// Full analysis: access sets, dependency graph, groups and usages,
    /// written into `analysis`.
    pub fn analyze_parallel_passes<'a>(
        &mut self,
        descriptors: impl IntoIterator<Item = &'a PassDescriptor>,
        analysis: &mut ParallelAnalysis,
    ) {
        redlilium_core::profile_function!();

        self.analyze_pass_resources(descriptors);
        build_dependency_graph_into(&self.accesses, &mut self.dependencies);
        group_passes_into(&self.dependencies, &mut analysis.groups);
        analysis.highest_parallel_group_count = highest_parallel_group_count(&analysis.groups);
        analysis.resource_usages = analyze_last_resource_usages(&self.accesses);

        log::debug!(
            "analyzed {} passes into {} groups (widest {})",
            self.accesses.len(),
            analysis.groups.len(),
            analysis.highest_parallel_group_count
        );
    }

    /// Access sets from the last analysis.
    pub fn accesses(&self) -> &[PassResourceAccess] {
        &self.accesses
    }

    /// Dependency graph from the last analysis.
    pub fn dependencies(&self) -> &[Vec<usize>] {
        &self.dependencies
    }
}
