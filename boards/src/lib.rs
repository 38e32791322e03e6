pub mod generic;
pub mod namco_fca1;
pub mod namco_jyu;
pub mod namco_tss;
pub mod registry;
pub mod sega_type_3;
