//! Output generators: naming templates, run reports and library trees.

pub mod html;
pub mod template;
pub mod tree;
