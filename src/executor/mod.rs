mod dispatch;

pub use dispatch::PreparedBatch;
