pub mod aspect;
pub mod error;
pub mod object;
pub mod options;
pub mod selector;
pub mod slots;
pub mod unique;
pub mod value;
