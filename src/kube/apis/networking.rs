pub mod gloo;
