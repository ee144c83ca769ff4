pub mod simulation;

pub use simulation::{simulate_var, ReturnModel, VarSimulationInput, VarSimulationOutput};
