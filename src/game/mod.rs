// Demo content driven by the headless host

pub mod scenes;

pub use scenes::{Scene, UnknownScene};
