// Core math shared by every engine module

pub mod math;
