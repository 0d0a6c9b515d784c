//! Device configuration.

/// Settings consumed by [`GraphicsDevice::new`](crate::GraphicsDevice::new).
///
/// # Example
///
/// ```
/// use redlilium_render_graph::GraphicsConfig;
///
/// let config = GraphicsConfig::default()
///     .with_worker_threads(4)
///     .with_uav_barriers_by_default(false);
/// assert_eq!(config.effective_threads(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsConfig {
    /// Worker threads recording passes. `None` uses the available parallelism.
    pub worker_threads: Option<usize>,
    /// Smallest number of passes handed to one worker.
    pub min_parallel_range: usize,
    /// Passes and descriptors reserved up front in a new graph.
    pub pass_capacity: usize,
    /// Whether back-to-back unordered-access uses get a UAV barrier unless
    /// disabled per resource.
    pub uav_barriers_by_default: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            min_parallel_range: 1,
            pass_capacity: 64,
            uav_barriers_by_default: true,
        }
    }
}

impl GraphicsConfig {
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_min_parallel_range(mut self, min_range: usize) -> Self {
        self.min_parallel_range = min_range;
        self
    }

    pub fn with_pass_capacity(mut self, capacity: usize) -> Self {
        self.pass_capacity = capacity;
        self
    }

    pub fn with_uav_barriers_by_default(mut self, enabled: bool) -> Self {
        self.uav_barriers_by_default = enabled;
        self
    }

    /// Worker thread count after resolving `None`. Never zero.
    pub fn effective_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphicsConfig::default();
        assert_eq!(config.worker_threads, None);
        assert_eq!(config.min_parallel_range, 1);
        assert!(config.uav_barriers_by_default);
        assert!(config.effective_threads() >= 1);
    }

    #[test]
    fn test_zero_threads_clamped() {
        assert_eq!(GraphicsConfig::default().with_worker_threads(0).effective_threads(), 1);
    }
}
