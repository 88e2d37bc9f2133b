/// 定時快照作業
pub mod snapshot;
