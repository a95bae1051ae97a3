pub mod argoproj;
pub mod networking;
