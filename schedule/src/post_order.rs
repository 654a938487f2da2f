//! Post-order scheduler: the computation's natural post-order, no heuristics.

use sumrak_ir::{ComputationId, InstrId, Module};

use crate::error::Result;

pub fn post_order_schedule(module: &Module, computation: ComputationId) -> Result<Vec<InstrId>> {
    Ok(module[computation].post_order())
}
