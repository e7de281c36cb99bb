//! oasis-lib: generation core for OASIS-style build descriptions
//!
//! This crate provides the two pieces a build-description tool needs to emit
//! its support files:
//! - `expr`: boolean conditions and last-match-wins choice lists, used to pick
//!   configuration-dependent values (flag defaults, per-platform settings)
//! - `template`: managed files whose `OASIS_START`/`OASIS_STOP` section is
//!   regenerated in place while hand edits around it are kept
//!
//! A typical run resolves choices against an [`expr::Env`], turns the result
//! into body lines, registers one [`template::Template`] per file in a
//! [`template::Registry`] and calls [`template::Registry::generate_all`].

pub mod consts;
pub mod expr;
pub mod platform;
pub mod template;
