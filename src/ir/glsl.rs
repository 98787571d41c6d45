//! Printing IR as shader source.
//!
//! The output is GLSL-like source text meant for humans.  A few IR shapes
//! have no source equivalent; they are printed as placeholders, and the
//! result is marked [`Fidelity::Partial`].

use core::fmt;
use core::mem;

use rustc_hash::FxHashMap;

use crate::tys::{BaseType, Fields, Sampler, SamplerDim, TypeRef};

use super::visit::{self, Visit};
use super::*;

/// How faithfully printed source represents the IR.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fidelity {
    /// Every instruction was printed as valid source.
    Exact,
    /// Some of the output is placeholder text.
    Partial,
}

/// Print a sequence of top-level instructions as source.
pub fn print_glsl<W>(
    w: &mut W,
    ir: &[Instruction<'_>],
) -> core::result::Result<Fidelity, fmt::Error>
where W: ?Sized + fmt::Write {
    let mut printer = Printer::new(w);
    for instruction in ir {
        printer.visit_instruction(instruction);
        printer.write_str("\n");
    }
    printer.finish()
}

/// Where a declaration appears.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DeclarationContext {
    /// A declaration statement, terminated by a semicolon.
    Statement,
    /// A function parameter, which only carries its direction.
    Parameter,
}

/// An IR visitor that prints source to the given output.
pub struct Printer<'a, W: ?Sized + fmt::Write> {
    /// The writer data is output to, or an error.
    writer: core::result::Result<&'a mut W, fmt::Error>,
    /// The indentation at which to write.
    indent: usize,
    /// The numbers assigned to temporaries, by variable ID.
    temporaries: FxHashMap<u32, u32>,
    /// The number of the next temporary.
    next_temporary: u32,
    fidelity: Fidelity,
}

impl<'a, W: ?Sized + fmt::Write> Printer<'a, W> {
    /// Construct a new [`Printer`].
    pub fn new(writer: &'a mut W) -> Self {
        Self {
            writer: Ok(writer),
            indent: 0,
            temporaries: FxHashMap::default(),
            next_temporary: 1,
            fidelity: Fidelity::Exact,
        }
    }

    /// Finish printing, reporting the fidelity of everything printed.
    pub fn finish(self) -> core::result::Result<Fidelity, fmt::Error> {
        self.writer.map(|_| self.fidelity)
    }

    fn write_str(&mut self, data: &str) {
        if let Ok(w) = &mut self.writer {
            if let Err(e) = w.write_str(data) {
                self.writer = Err(e);
            }
        }
    }

    fn write_fmt(&mut self, data: fmt::Arguments<'_>) {
        if let Ok(w) = &mut self.writer {
            if let Err(e) = w.write_fmt(data) {
                self.writer = Err(e);
            }
        }
    }

    fn write_newline(&mut self) {
        self.write_str("\n");
        for _ in 0 .. self.indent {
            self.write_str("    ");
        }
    }

    /// Note that placeholder text is being printed.
    fn placeholder(&mut self, what: fmt::Arguments<'_>) {
        log::warn!("no source form for {}; printing a placeholder", what);
        self.fidelity = Fidelity::Partial;
    }

    /// Write a braced block of instructions.
    fn write_block(&mut self, block: &[Instruction<'_>]) {
        self.write_str("{");
        self.indent += 1;
        self.visit_instructions(block);
        self.indent -= 1;
        self.write_newline();
        self.write_str("}");
    }

    fn write_type(&mut self, ty: TypeRef<'_>) {
        match (&ty.fields, ty.name) {
            (Fields::Array(element), _) => {
                self.write_type(element);
                write!(self, "[{}]", ty.length);
            },
            _ if ty.is_error() => {
                self.placeholder(format_args!("the error type"));
                self.write_str("error");
            },
            (_, Some(name)) => self.write_str(name),
            (_, None) => {
                self.placeholder(format_args!("anonymous type {}", ty));
                write!(self, "{}", ty);
            },
        }
    }

    /// Write the name of a variable.
    ///
    /// Temporaries are numbered in order of first appearance.
    fn write_variable(&mut self, var: VarRef<'_>) {
        if var.mode != Mode::Temporary {
            self.write_str(var.name);
            return;
        }

        let next = &mut self.next_temporary;
        let number = *self.temporaries.entry(var.id()).or_insert_with(|| {
            *next += 1;
            *next - 1
        });
        write!(self, "tmpvar_{}", number);
    }

    fn write_declaration(&mut self, var: VarRef<'_>, context: DeclarationContext) {
        let quals = match context {
            DeclarationContext::Statement => [
                var.invariant.then_some("invariant"),
                var.interpolation.qualifier(),
                var.centroid.then_some("centroid"),
                var.mode.qualifier().filter(|_| var.mode != Mode::Temporary),
            ],
            DeclarationContext::Parameter => [
                None,
                None,
                None,
                var.mode.qualifier()
                    .filter(|_| matches!(var.mode, Mode::In | Mode::Out | Mode::InOut)),
            ],
        };

        for qual in quals.into_iter().flatten() {
            self.write_str(qual);
            self.write_str(" ");
        }
        self.write_type(var.ty);
        self.write_str(" ");
        self.write_variable(var);
        if context == DeclarationContext::Statement {
            self.write_str(";");
        }
    }

    /// Write `if (<condition>) `.
    fn write_condition(&mut self, condition: &Rvalue<'_>) {
        match condition {
            Rvalue::Expression(x) if is_parenthesized(x) => {
                self.write_str("if ");
                self.visit_rvalue(condition);
                self.write_str(" ");
            },
            _ => {
                self.write_str("if (");
                self.visit_rvalue(condition);
                self.write_str(") ");
            },
        }
    }

    /// Write the coordinate of a texture lookup.
    ///
    /// Source lookups take the depth reference and the projector as extra
    /// coordinate components.
    fn write_texture_coordinate(&mut self, i: &Texture<'_>, sampler: Sampler) {
        if i.shadow_comparator.is_none() && i.projector.is_none() {
            self.visit_rvalue(&i.coordinate);
            return;
        }

        // One-dimensional shadow lookups keep the reference in the third
        // component.
        let pad = i.shadow_comparator.is_some()
            && sampler.dim == SamplerDim::D1
            && !sampler.array;
        let n = i.coordinate.ty().components() as usize
            + usize::from(pad)
            + usize::from(i.shadow_comparator.is_some())
            + usize::from(i.projector.is_some());
        if n > 4 {
            self.placeholder(format_args!("a {}-component texture coordinate", n));
        }

        write!(self, "vec{}(", n);
        self.visit_rvalue(&i.coordinate);
        if pad {
            self.write_str(", 0.0");
        }
        for extra in [&i.shadow_comparator, &i.projector].into_iter().flatten() {
            self.write_str(", ");
            self.visit_rvalue(extra);
        }
        self.write_str(")");
    }

    /// Write a comma-separated argument list, in parentheses.
    fn write_args(&mut self, args: &[Rvalue<'_>]) {
        self.write_str("(");
        for (index, arg) in args.iter().enumerate() {
            if index != 0 {
                self.write_str(", ");
            }
            self.visit_rvalue(arg);
        }
        self.write_str(")");
    }
}

impl<'a, 'c, W: ?Sized + fmt::Write> Visit<'c> for Printer<'a, W> {
    fn visit_instructions(&mut self, i: &[Instruction<'c>]) {
        for instruction in i {
            self.write_newline();
            self.visit_instruction(instruction);
        }
    }

    fn visit_instruction(&mut self, i: &Instruction<'c>) {
        match i {
            Instruction::Rvalue(x) => {
                self.visit_rvalue(x);
                self.write_str(";");
            },
            _ => visit::visit_instruction(self, i),
        }
    }

    fn visit_declaration(&mut self, i: VarRef<'c>) {
        self.write_declaration(i, DeclarationContext::Statement);
    }

    fn visit_function(&mut self, i: &Function<'c>) {
        for (index, sig) in i.signatures.iter().enumerate() {
            if index != 0 {
                self.write_newline();
            }
            self.visit_signature(i, sig);
        }
    }

    fn visit_signature(&mut self, f: &Function<'c>, i: &Signature<'c>) {
        let outer_temporaries = mem::take(&mut self.temporaries);
        let outer_next = mem::replace(&mut self.next_temporary, 1);

        self.write_type(i.return_type);
        write!(self, " {}(", f.name);
        for (index, &param) in i.parameters.iter().enumerate() {
            if index != 0 {
                self.write_str(", ");
            }
            self.write_declaration(param, DeclarationContext::Parameter);
        }
        self.write_str(")");
        if i.is_defined {
            self.write_str(" ");
            self.write_block(&i.body);
        } else {
            self.write_str(";");
        }

        self.temporaries = outer_temporaries;
        self.next_temporary = outer_next;
    }

    fn visit_assignment(&mut self, i: &Assignment<'c>) {
        if let Some(condition) = &i.condition {
            self.write_condition(condition);
        }

        self.visit_dereference(&i.lhs);
        if i.write_mask != Assignment::full_mask(i.lhs.ty()) {
            write!(self, ".{}", i.write_mask_letters());
        }
        self.write_str(" = ");
        self.visit_rvalue(&i.rhs);
        self.write_str(";");
    }

    fn visit_return(&mut self, i: &Return<'c>) {
        self.write_str("return");
        if let Some(value) = &i.value {
            self.write_str(" ");
            self.visit_rvalue(value);
        }
        self.write_str(";");
    }

    fn visit_if(&mut self, i: &If<'c>) {
        self.write_condition(&i.condition);
        self.write_block(&i.then_instructions);
        if !i.else_instructions.is_empty() {
            self.write_str(" else ");
            self.write_block(&i.else_instructions);
        }
    }

    fn visit_loop(&mut self, i: &Loop<'c>) {
        let cond = i.cmp.and_then(Operator::negate_comparison);
        match (i.counter, &i.from, &i.to, &i.increment, cond) {
            (Some(counter), Some(from), Some(to), Some(increment), Some(cond)) => {
                // The stored comparison ends the loop; print the one that
                // continues it.
                self.write_str("for (");
                self.write_variable(counter);
                self.write_str(" = ");
                self.visit_rvalue(from);
                self.write_str("; ");
                self.write_variable(counter);
                write!(self, " {} ", cond);
                self.visit_rvalue(to);
                self.write_str("; ");
                self.write_variable(counter);
                self.write_str(" += ");
                self.visit_rvalue(increment);
                self.write_str(") ");
            },
            _ if i.is_bare() => self.write_str("while (true) "),
            _ => {
                self.placeholder(format_args!("a loop with partial controls"));
                self.write_str("loop (");
                match i.counter {
                    Some(counter) => self.write_variable(counter),
                    None => self.write_str("_"),
                }
                self.write_str(", ");
                match &i.from {
                    Some(from) => self.visit_rvalue(from),
                    None => self.write_str("_"),
                }
                self.write_str(", ");
                match (i.cmp, &i.to) {
                    (Some(cmp), Some(to)) => {
                        write!(self, "{} ", cmp);
                        self.visit_rvalue(to);
                    },
                    _ => self.write_str("_"),
                }
                self.write_str(", ");
                match &i.increment {
                    Some(increment) => self.visit_rvalue(increment),
                    None => self.write_str("_"),
                }
                self.write_str(") ");
            },
        }
        self.write_block(&i.body);
    }

    fn visit_loop_jump(&mut self, i: &LoopJump) {
        write!(self, "{};", i.mode);
    }

    fn visit_expression(&mut self, i: &Expression<'c>) {
        let op = i.op;
        match &i.operands[..] {
            [x] if op.is_conversion() => {
                self.write_type(i.ty);
                self.write_args(core::slice::from_ref(x));
            },
            [x] if op == Operator::LogicNot && i.ty.is_vector() => {
                self.write_str("not");
                self.write_args(core::slice::from_ref(x));
            },
            [x] if op == Operator::Rcp => {
                self.write_str("(1.0 / ");
                self.visit_rvalue(x);
                self.write_str(")");
            },
            [x] if op.prefix_symbol().is_some() => {
                self.write_str("(");
                self.write_str(op.prefix_symbol().unwrap_or_default());
                self.visit_rvalue(x);
                self.write_str(")");
            },
            [_, _] if op.is_comparison() && i.ty.is_vector() => {
                self.write_str(vector_comparison(op));
                self.write_args(&i.operands);
            },
            [a, _] if op == Operator::Mod && !a.ty().is_integer() => {
                self.write_str("mod");
                self.write_args(&i.operands);
            },
            [a, b] if op.infix_symbol().is_some() => {
                self.write_str("(");
                self.visit_rvalue(a);
                write!(self, " {} ", op.infix_symbol().unwrap_or_default());
                self.visit_rvalue(b);
                self.write_str(")");
            },
            args => {
                self.write_str(match op {
                    Operator::Rsq => "inversesqrt",
                    _ => op.name(),
                });
                self.write_args(args);
            },
        }
    }

    fn visit_swizzle(&mut self, i: &Swizzle<'c>) {
        if i.value.ty().is_scalar() {
            // Selecting the only component of a scalar is a no-op, and
            // repeating it is a vector constructor.
            if i.mask.is_identity_scalar() {
                self.visit_rvalue(&i.value);
            } else {
                self.write_type(i.ty);
                self.write_args(core::slice::from_ref(&i.value));
            }
            return;
        }

        self.visit_rvalue(&i.value);
        write!(self, ".{}", i.mask);
    }

    fn visit_dereference(&mut self, i: &Dereference<'c>) {
        match i {
            Dereference::Variable(var) => self.write_variable(*var),
            Dereference::Array { array, index, .. } => {
                self.visit_rvalue(array);
                self.write_str("[");
                self.visit_rvalue(index);
                self.write_str("]");
            },
            Dereference::Record { record, field, .. } => {
                self.visit_rvalue(record);
                write!(self, ".{}", field);
            },
        }
    }

    fn visit_constant(&mut self, i: &Constant<'c>) {
        if let ConstantValue::Array(elements) = &i.value {
            self.write_type(i.ty);
            self.write_str("(");
            for (index, element) in elements.iter().enumerate() {
                if index != 0 {
                    self.write_str(", ");
                }
                self.visit_constant(element);
            }
            self.write_str(")");
            return;
        }

        let scalar = i.ty.is_scalar();
        if !scalar {
            self.write_type(i.ty);
            self.write_str("(");
        }
        for (index, value) in i.components().enumerate() {
            if index != 0 {
                self.write_str(", ");
            }
            match value {
                Scalar::Float(x) => write!(self, "{:?}", x),
                Scalar::Int(x) => write!(self, "{}", x),
                Scalar::Uint(x) => write!(self, "{}u", x),
                Scalar::Bool(x) => write!(self, "{}", x),
            }
        }
        if !scalar {
            self.write_str(")");
        }
    }

    fn visit_call(&mut self, i: &Call<'c>) {
        self.write_str(i.callee);
        self.write_args(&i.args);
    }

    fn visit_texture(&mut self, i: &Texture<'c>) {
        let Some(sampler) = i.sampler.ty().sampler else {
            self.placeholder(format_args!("a lookup through {}", i.sampler.ty()));
            write!(self, "{}(", i.op.name());
            self.visit_dereference(&i.sampler);
            self.write_str(", ");
            self.visit_rvalue(&i.coordinate);
            self.write_str(")");
            return;
        };

        let offset = i.offsets != [0; 3];
        self.write_str(&texture_function(i, sampler, offset));
        self.write_str("(");
        self.visit_dereference(&i.sampler);
        self.write_str(", ");
        self.write_texture_coordinate(i, sampler);

        match &i.op {
            TextureOp::Tex | TextureOp::Txb { .. } => {},
            TextureOp::Txl { lod } | TextureOp::Txf { lod } => {
                self.write_str(", ");
                self.visit_rvalue(lod);
            },
            TextureOp::Txd { dpdx, dpdy } => {
                self.write_str(", ");
                self.visit_rvalue(dpdx);
                self.write_str(", ");
                self.visit_rvalue(dpdy);
            },
        }
        if offset {
            let n = coordinate_size(sampler.dim);
            let offsets = &i.offsets[.. n];
            match offsets {
                [x] => write!(self, ", {}", x),
                _ => {
                    write!(self, ", ivec{}(", n);
                    for (index, x) in offsets.iter().enumerate() {
                        if index != 0 {
                            self.write_str(", ");
                        }
                        write!(self, "{}", x);
                    }
                    self.write_str(")");
                },
            }
        }
        // The bias always comes last.
        if let TextureOp::Txb { bias } = &i.op {
            self.write_str(", ");
            self.visit_rvalue(bias);
        }
        self.write_str(")");
    }
}

/// The source function performing a texture lookup.
///
/// Lookups that older source versions can express use their dedicated
/// per-sampler functions, like `texture2DProj`; the rest use the overloaded
/// functions, like `textureGradOffset`.
fn texture_function(i: &Texture<'_>, sampler: Sampler, offset: bool) -> String {
    let proj = if i.projector.is_some() { "Proj" } else { "" };
    let legacy = legacy_dim_name(sampler)
        .filter(|_| !offset)
        .filter(|_| matches!(i.op, TextureOp::Tex | TextureOp::Txb { .. } | TextureOp::Txl { .. }));

    let mut name = match (&i.op, legacy) {
        (TextureOp::Txf { .. }, _) => String::from("texelFetch"),
        (_, Some(dim)) => {
            let kind = if sampler.shadow { "shadow" } else { "texture" };
            format!("{}{}{}", kind, dim, proj)
        },
        (_, None) => format!("texture{}", proj),
    };
    match &i.op {
        TextureOp::Txl { .. } => name.push_str("Lod"),
        TextureOp::Txd { .. } => name.push_str("Grad"),
        _ => {},
    }
    if offset {
        name.push_str("Offset");
    }
    name
}

/// The dimension suffix of the dedicated lookup functions of a sampler, if
/// it has them.
fn legacy_dim_name(sampler: Sampler) -> Option<&'static str> {
    if sampler.array || sampler.result != BaseType::Float {
        return None;
    }

    match (sampler.dim, sampler.shadow) {
        (SamplerDim::D1, _) => Some("1D"),
        (SamplerDim::D2, _) => Some("2D"),
        (SamplerDim::D3, false) => Some("3D"),
        (SamplerDim::Cube, false) => Some("Cube"),
        (SamplerDim::Rect, _) => Some("2DRect"),
        _ => None,
    }
}

/// The number of coordinate components addressing a texel of a sampler.
fn coordinate_size(dim: SamplerDim) -> usize {
    match dim {
        SamplerDim::D1 | SamplerDim::Buffer => 1,
        SamplerDim::D2 | SamplerDim::Rect => 2,
        SamplerDim::D3 | SamplerDim::Cube => 3,
    }
}

/// Whether an expression prints enclosed in its own parentheses.
///
/// This follows the cases of `visit_expression`.
fn is_parenthesized(x: &Expression<'_>) -> bool {
    let op = x.op;
    match &x.operands[..] {
        [_] => !op.is_conversion()
            && !(op == Operator::LogicNot && x.ty.is_vector())
            && (op == Operator::Rcp || op.prefix_symbol().is_some()),
        [a, _] => !(op.is_comparison() && x.ty.is_vector())
            && !(op == Operator::Mod && !a.ty().is_integer())
            && op.infix_symbol().is_some(),
        _ => false,
    }
}

/// The built-in function comparing vectors componentwise.
fn vector_comparison(op: Operator) -> &'static str {
    match op {
        Operator::Less => "lessThan",
        Operator::Greater => "greaterThan",
        Operator::LEqual => "lessThanEqual",
        Operator::GEqual => "greaterThanEqual",
        Operator::Equal => "equal",
        _ => "notEqual",
    }
}
