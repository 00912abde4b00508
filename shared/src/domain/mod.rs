pub mod emission;
pub mod entities;
pub mod repositories;
pub mod state_machine;
pub mod unlock;
