//! WGSL program assembly.
//!
//! This module handles:
//! - choosing the output node and the nodes it depends on
//! - emitting one statement per node in dependency order
//! - wrapping the statements in the fixed program template, or returning the fallback
//!   program when there is nothing to compile

use anyhow::Result;
use log::debug;

use crate::dsl::Graph;
use crate::graph::{select_terminal, topo_sort, upstream_closure};

use super::idents::IdentAllocator;
use super::node_compiler::{Emitted, NodeInputs, compile_node};
use super::types::{Bindings, CompileOptions, TypedExpr};

/// Fragment-stage local holding the normalized screen coordinate.
pub const UV_LOCAL: &str = "uv";
/// Fragment-stage local holding the time uniform.
pub const TIME_LOCAL: &str = "u_time";
/// Fragment-stage local the output node assigns to.
pub const FINAL_COLOR_LOCAL: &str = "final_color";

/// Program used when the graph has no output node: a full-screen triangle filled with
/// opaque black. Independent of graph contents.
pub const FALLBACK_WGSL: &str = r#"@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4f {
    var positions = array<vec2f, 3>(
        vec2f(-1.0, -1.0),
        vec2f(3.0, -1.0),
        vec2f(-1.0, 3.0),
    );
    return vec4f(positions[vertex_index], 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(0.0, 0.0, 0.0, 1.0);
}
"#;

const PROGRAM_HEADER: &str = r#"struct Uniforms {
    time: f32,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

struct VSOut {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VSOut {
    var positions = array<vec2f, 3>(
        vec2f(-1.0, -1.0),
        vec2f(3.0, -1.0),
        vec2f(-1.0, 3.0),
    );
    let p = positions[vertex_index];

    var out: VSOut;
    out.position = vec4f(p, 0.0, 1.0);
    // Clip space to [0,1] with (0,0) at the top-left of the canvas.
    out.uv = vec2f(p.x * 0.5 + 0.5, 0.5 - p.y * 0.5);
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4f {
    let uv = in.uv;
    let u_time = u.time;
    var final_color = vec3f(0.0, 0.0, 0.0);
"#;

const PROGRAM_FOOTER: &str = r#"    return vec4f(final_color, 1.0);
}
"#;

/// Wrap fragment-body statements in the program template.
pub fn build_program(statements: &[String]) -> String {
    let body_len: usize = statements.iter().map(|s| s.len() + 5).sum();
    let mut out = String::with_capacity(PROGRAM_HEADER.len() + body_len + PROGRAM_FOOTER.len());
    out.push_str(PROGRAM_HEADER);
    for stmt in statements {
        out.push_str("    ");
        out.push_str(stmt);
        out.push('\n');
    }
    out.push_str(PROGRAM_FOOTER);
    out
}

/// Compile a graph to a WGSL program.
///
/// Never fails: a graph without an output node yields [`FALLBACK_WGSL`], and broken
/// pieces (dangling or cyclic wires, unknown kinds, malformed expressions) compile to
/// zero values.
pub fn compile(graph: &Graph) -> String {
    match compile_with_options(graph, &CompileOptions::default()) {
        Ok(wgsl) => wgsl,
        Err(e) => {
            log::warn!("lenient compile failed: {e:#}; using fallback program");
            FALLBACK_WGSL.to_string()
        }
    }
}

/// Compile a graph to a WGSL program under `options`.
///
/// With default options this is [`compile`] and cannot fail. Strict options turn
/// identifier collisions and malformed `Expr` text into errors.
pub fn compile_with_options(graph: &Graph, options: &CompileOptions) -> Result<String> {
    let Some(terminal) = select_terminal(graph) else {
        debug!("no OutputFinal node; emitting fallback program");
        return Ok(FALLBACK_WGSL.to_string());
    };

    let closure = upstream_closure(graph, &terminal.id);
    let order = topo_sort(graph).retain(&closure);
    if order.is_empty() {
        debug!("empty closure for {:?}; emitting fallback program", terminal.id);
        return Ok(FALLBACK_WGSL.to_string());
    }
    debug!(
        "compiling {} of {} nodes for output {:?} ({} back edges): {:?}",
        order.len(),
        graph.nodes.len(),
        terminal.id,
        order.back_edge_count(),
        order.ids()
    );

    let mut idents = IdentAllocator::new();
    let mut bindings = Bindings::default();
    let mut statements: Vec<String> = Vec::with_capacity(order.len());

    for node in order.nodes() {
        // Only the selected output writes the final color.
        if node.node_kind().is_terminal() && node.id != terminal.id {
            debug!("skipping inactive output {:?}", node.id);
            continue;
        }

        let inputs = NodeInputs::new(node, &order, &bindings);
        match compile_node(node, &inputs, options)? {
            Emitted::Value(value) => {
                let ident = idents.allocate(&node.id, options.strict_identifiers)?;
                statements.push(format!("let {ident}: {} = {};", value.ty.wgsl(), value.expr));
                bindings.bind(&node.id, TypedExpr::new(ident, value.ty));
            }
            Emitted::Sink(stmt) => statements.push(stmt),
        }
    }

    Ok(build_program(&statements))
}
