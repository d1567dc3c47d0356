//! Parent resolver port (interface).

/// Port for looking up a process's parent.
pub trait ParentResolverPort: Send + Sync {
    /// Parent pid of `pid`, or `None` when it cannot be determined.
    fn parent_of(&self, pid: u32) -> impl std::future::Future<Output = Option<u32>> + Send;
}
