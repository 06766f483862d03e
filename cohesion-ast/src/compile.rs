//! The pipeline driver: wires the compiler passes together in their
//! dependency order and hands back the finished aggregate.

use cohesion_dsl::ast::Module;
use specifications::Config;

use crate::aggregate::Aggregate;
use crate::errors::CompileError;
use crate::state::{NameTable, StateNameTable};
use crate::traversals::{cir_build, coloring, helper_extract, lifting, pass_elim, variables, wir_build};

/// The magic module name the coloring analyzer triggers on. Not
/// configurable — every remote call goes through this one fixed name.
pub const MAGIC_MODULE: &str = "cohesion";

pub fn compile(source: &str, config: &Config) -> Result<Aggregate, CompileError> {
    let module: Module = cohesion_dsl::parse(source)?;
    compile_module(module, config)
}

fn compile_module(mut module: Module, config: &Config) -> Result<Aggregate, CompileError> {
    let mut names = NameTable::from_module(&module);

    log::debug!("coloring");
    coloring::color(&mut module, MAGIC_MODULE)?;

    log::debug!("call lifting");
    lifting::lift(&mut module, &mut names)?;

    log::debug!("variable rewrite");
    variables::rewrite(&mut module);

    log::debug!("CIR build");
    let cir = cir_build::build(&module)?;

    let mut agg = Aggregate::new();

    log::debug!("helper extraction");
    let cir = helper_extract::extract(cir, &mut agg, &mut names);
    debug_assert!(cir.has_no_raw_blocks(), "helper extraction left a RawBlock in the CIR");

    log::debug!("WIR build");
    let mut state_names = StateNameTable::default();
    let workflows = wir_build::build(&cir, config, &mut names, &mut state_names, &mut agg)?;
    agg.workflows = workflows;
    agg.cir = Some(cir);

    log::debug!("pass elimination");
    pass_elim::eliminate(&mut agg)?;

    for workflow in &agg.workflows {
        agg.graphs.insert(workflow.name.clone(), crate::emit::graph_json::build(workflow));
    }

    Ok(agg)
}
