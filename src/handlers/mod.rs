// Handlers by security tier:
// Public (no auth) -> Protected (bearer JWT whose `sub` is a member id)
pub mod protected;
pub mod public;
