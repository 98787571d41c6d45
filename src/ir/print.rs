//! Textual representation of IR.
//!
//! The output is the S-expression form accepted by [`read`](super::read):
//! reading printed IR and printing it again reproduces the same text.

use core::fmt;

use super::*;

/// Format a sequence of top-level instructions, one per line.
pub fn print_ir(w: impl fmt::Write, ir: &[Instruction<'_>]) -> fmt::Result {
    let mut this = Formatter { inner: w, indent: String::new() };
    for instruction in ir {
        this.format_instruction(instruction)?;
        this.inner.write_char('\n')?;
    }
    Ok(())
}

/// A syntactic formatter for IR.
struct Formatter<W: fmt::Write> {
    /// The underlying writer.
    inner: W,

    /// The current indentation.
    indent: String,
}

impl<W: fmt::Write> Formatter<W> {
    /// Format an instruction.
    fn format_instruction(&mut self, ir: &Instruction<'_>) -> fmt::Result {
        match ir {
            Instruction::Variable(var) => self.format_declaration(var),
            Instruction::Function(f) => self.format_function(f),
            Instruction::Assignment(a) => {
                self.inner.write_str("(assign ")?;
                match &a.condition {
                    Some(c) => self.format_rvalue(c)?,
                    None => self.inner.write_str("()")?,
                }
                write!(self.inner, " ({}) ", a.write_mask_letters())?;
                self.format_dereference(&a.lhs)?;
                self.inner.write_char(' ')?;
                self.format_rvalue(&a.rhs)?;
                self.inner.write_char(')')
            },
            Instruction::Return(r) => {
                self.inner.write_str("(return")?;
                if let Some(value) = &r.value {
                    self.inner.write_char(' ')?;
                    self.format_rvalue(value)?;
                }
                self.inner.write_char(')')
            },
            Instruction::If(x) => {
                self.inner.write_str("(if ")?;
                self.format_rvalue(&x.condition)?;
                self.inner.write_char(' ')?;
                self.write_block(&x.then_instructions)?;
                self.inner.write_char(' ')?;
                self.write_block(&x.else_instructions)?;
                self.inner.write_char(')')
            },
            Instruction::Loop(l) => self.format_loop(l),
            Instruction::LoopJump(j) => self.inner.write_str(j.mode.name()),
            Instruction::Rvalue(r) => self.format_rvalue(r),
        }
    }

    /// Format a variable declaration.
    fn format_declaration(&mut self, var: &Variable<'_>) -> fmt::Result {
        let quals = [
            var.centroid.then_some("centroid"),
            var.invariant.then_some("invariant"),
            var.interpolation.qualifier(),
            var.mode.qualifier(),
        ];

        self.inner.write_str("(declare (")?;
        for (i, qual) in quals.into_iter().flatten().enumerate() {
            if i != 0 {
                self.inner.write_char(' ')?;
            }
            self.inner.write_str(qual)?;
        }
        write!(self.inner, ") {} {})", var.ty, var.name)
    }

    /// Format a function and all of its signatures.
    fn format_function(&mut self, f: &Function<'_>) -> fmt::Result {
        write!(self.inner, "(function {}", f.name)?;
        self.indented(|this| {
            for sig in &f.signatures {
                this.write_newline()?;
                this.format_signature(sig)?;
            }
            Ok(())
        })?;
        self.write_newline()?;
        self.inner.write_char(')')
    }

    /// Format a signature.
    fn format_signature(&mut self, sig: &Signature<'_>) -> fmt::Result {
        write!(self.inner, "(signature {}", sig.return_type)?;
        self.indented(|this| {
            this.write_newline()?;
            this.inner.write_str("(parameters")?;
            this.indented(|this| {
                for &param in &sig.parameters {
                    this.write_newline()?;
                    this.format_declaration(&param)?;
                }
                Ok(())
            })?;
            this.inner.write_char(')')?;
            this.write_newline()?;
            this.write_block(&sig.body)
        })?;
        self.inner.write_char(')')
    }

    /// Format a loop.
    fn format_loop(&mut self, l: &Loop<'_>) -> fmt::Result {
        self.inner.write_str("(loop (")?;
        if let Some(counter) = l.counter {
            self.inner.write_str(counter.name)?;
        }
        self.inner.write_str(") (")?;
        if let Some(from) = &l.from {
            self.format_rvalue(from)?;
        }
        self.inner.write_str(") (")?;
        if let (Some(cmp), Some(to)) = (l.cmp, &l.to) {
            write!(self.inner, "{} ", cmp)?;
            self.format_rvalue(to)?;
        }
        self.inner.write_str(") (")?;
        if let Some(increment) = &l.increment {
            self.format_rvalue(increment)?;
        }
        self.inner.write_str(") ")?;
        self.write_block(&l.body)?;
        self.inner.write_char(')')
    }

    /// Format an rvalue.
    fn format_rvalue(&mut self, ir: &Rvalue<'_>) -> fmt::Result {
        match ir {
            Rvalue::Expression(x) => {
                write!(self.inner, "(expression {} {}", x.ty, x.op)?;
                for operand in &x.operands {
                    self.inner.write_char(' ')?;
                    self.format_rvalue(operand)?;
                }
                self.inner.write_char(')')
            },
            Rvalue::Swizzle(x) => {
                write!(self.inner, "(swiz {} ", x.mask)?;
                self.format_rvalue(&x.value)?;
                self.inner.write_char(')')
            },
            Rvalue::Dereference(x) => self.format_dereference(x),
            Rvalue::Constant(x) => self.format_constant(x),
            Rvalue::Call(x) => {
                write!(self.inner, "(call {} (", x.callee)?;
                for (i, arg) in x.args.iter().enumerate() {
                    if i != 0 {
                        self.inner.write_char(' ')?;
                    }
                    self.format_rvalue(arg)?;
                }
                self.inner.write_str("))")
            },
            Rvalue::Texture(x) => self.format_texture(x),
        }
    }

    /// Format a texture lookup.
    fn format_texture(&mut self, ir: &Texture<'_>) -> fmt::Result {
        write!(self.inner, "({} ", ir.op.name())?;
        self.format_dereference(&ir.sampler)?;
        self.inner.write_char(' ')?;
        self.format_rvalue(&ir.coordinate)?;
        let [x, y, z] = ir.offsets;
        write!(self.inner, " ({} {} {}) ", x, y, z)?;

        if let TextureOp::Txf { lod } = &ir.op {
            self.format_rvalue(lod)?;
            return self.inner.write_char(')');
        }

        // A projector of 1 is no projection at all.
        match &ir.projector {
            Some(projector) => self.format_rvalue(projector)?,
            None => self.inner.write_char('1')?,
        }
        self.inner.write_char(' ')?;
        match &ir.shadow_comparator {
            Some(comparator) => self.format_rvalue(comparator)?,
            None => self.inner.write_str("()")?,
        }

        match &ir.op {
            TextureOp::Txb { bias: x } | TextureOp::Txl { lod: x } => {
                self.inner.write_char(' ')?;
                self.format_rvalue(x)?;
            },
            TextureOp::Txd { dpdx, dpdy } => {
                self.inner.write_str(" (")?;
                self.format_rvalue(dpdx)?;
                self.inner.write_char(' ')?;
                self.format_rvalue(dpdy)?;
                self.inner.write_char(')')?;
            },
            TextureOp::Tex | TextureOp::Txf { .. } => {},
        }
        self.inner.write_char(')')
    }

    /// Format a dereference.
    fn format_dereference(&mut self, ir: &Dereference<'_>) -> fmt::Result {
        match ir {
            Dereference::Variable(var) => write!(self.inner, "(var_ref {})", var.name),
            Dereference::Array { array, index, .. } => {
                self.inner.write_str("(array_ref ")?;
                self.format_rvalue(array)?;
                self.inner.write_char(' ')?;
                self.format_rvalue(index)?;
                self.inner.write_char(')')
            },
            Dereference::Record { record, field, .. } => {
                self.inner.write_str("(record_ref ")?;
                self.format_rvalue(record)?;
                write!(self.inner, " {})", field)
            },
        }
    }

    /// Format a constant.
    fn format_constant(&mut self, ir: &Constant<'_>) -> fmt::Result {
        write!(self.inner, "(constant {} (", ir.ty)?;
        if let ConstantValue::Array(elements) = &ir.value {
            for (i, element) in elements.iter().enumerate() {
                if i != 0 {
                    self.inner.write_char(' ')?;
                }
                self.format_constant(element)?;
            }
        } else {
            for (i, value) in ir.components().enumerate() {
                if i != 0 {
                    self.inner.write_char(' ')?;
                }
                match value {
                    // Debug formatting always keeps a decimal point or exponent.
                    Scalar::Float(x) => write!(self.inner, "{:?}", x)?,
                    Scalar::Int(x) => write!(self.inner, "{}", x)?,
                    Scalar::Uint(x) => write!(self.inner, "{}", x)?,
                    Scalar::Bool(x) => write!(self.inner, "{}", u8::from(x))?,
                }
            }
        }
        self.inner.write_str("))")
    }

    /// Write a parenthesized list of instructions, one per line.
    fn write_block(&mut self, block: &[Instruction<'_>]) -> fmt::Result {
        if block.is_empty() {
            return self.inner.write_str("()");
        }

        self.inner.write_char('(')?;
        self.indented(|this| {
            for instruction in block {
                this.write_newline()?;
                this.format_instruction(instruction)?;
            }
            Ok(())
        })?;
        self.write_newline()?;
        self.inner.write_char(')')
    }

    /// Run `f` one level of indentation deeper.
    fn indented<F>(&mut self, f: F) -> fmt::Result
    where F: FnOnce(&mut Self) -> fmt::Result {
        let outer_len = self.indent.len();
        self.indent.push_str("    ");
        let result = (f)(self);
        self.indent.truncate(outer_len);
        result
    }

    /// Write a newline and indent.
    fn write_newline(&mut self) -> fmt::Result {
        self.inner.write_char('\n')?;
        self.inner.write_str(&self.indent)
    }
}

impl<'c> fmt::Display for Instruction<'c> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Formatter { inner: f, indent: String::new() }.format_instruction(self)
    }
}

impl<'c> fmt::Display for Rvalue<'c> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Formatter { inner: f, indent: String::new() }.format_rvalue(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Storage;
    use crate::tys::builtin::*;

    use super::*;

    #[test]
    fn declarations_print_their_qualifiers() {
        let storage = Storage::new();
        let mut var = Variable::new(storage.intern("x"), &FLOAT);
        var.mode = Mode::Uniform;
        let var = storage.variable(var);
        assert_eq!(Instruction::Variable(var).to_string(), "(declare (uniform) float x)");

        let mut var = Variable::new(storage.intern("c"), storage.get_array_instance(&VEC4, 2));
        var.centroid = true;
        var.interpolation = Interpolation::NoPerspective;
        var.mode = Mode::Out;
        let var = storage.variable(var);
        assert_eq!(Instruction::Variable(var).to_string(),
            "(declare (centroid noperspective out) (array vec4 2) c)");
    }

    #[test]
    fn rvalues_print_operators_and_values() {
        let storage = Storage::new();
        let v = storage.variable(Variable::new(storage.intern("v"), &VEC3));
        let v = Rvalue::from(Dereference::variable(v).unwrap());
        let c = Rvalue::from(Constant::float(&VEC3, &[1.0, -0.5, 2.0]).unwrap());
        let sum = Expression::new(Operator::Add, &VEC3, vec![v, c]).unwrap();
        let swiz = Swizzle::new(sum.into(), SwizzleMask::parse("zx").unwrap()).unwrap();
        assert_eq!(Rvalue::from(swiz).to_string(),
            "(swiz zx (expression vec3 + (var_ref v) (constant vec3 (1.0 -0.5 2.0))))");

        let b = Constant::bool(&BVEC2, &[true, false]).unwrap();
        assert_eq!(Rvalue::from(b).to_string(), "(constant bvec2 (1 0))");
    }

    #[test]
    fn textures_print_their_operands() {
        let storage = Storage::new();
        let s = storage.variable(Variable::new(storage.intern("s"), &SAMPLER2DSHADOW));
        let uv = storage.variable(Variable::new(storage.intern("uv"), &VEC2));
        let uv = || Rvalue::from(Dereference::variable(uv).unwrap());
        let half = || Rvalue::from(Constant::float(&FLOAT, &[0.5]).unwrap());

        let mut tex = Texture::new(
            TextureOp::Txd { dpdx: uv(), dpdy: uv() },
            Dereference::variable(s).unwrap(),
            uv(),
        ).unwrap();
        tex.shadow_comparator = Some(half());
        tex.offsets = [1, -1, 0];
        assert!(core::ptr::eq(tex.ty, &FLOAT));
        assert_eq!(Rvalue::from(tex).to_string(),
            "(txd (var_ref s) (var_ref uv) (1 -1 0) 1 (constant float (0.5)) \
             ((var_ref uv) (var_ref uv)))");

        let mut tex = Texture::new(TextureOp::Tex, Dereference::variable(s).unwrap(), uv())
            .unwrap();
        tex.projector = Some(half());
        assert_eq!(Rvalue::from(tex).to_string(),
            "(tex (var_ref s) (var_ref uv) (0 0 0) (constant float (0.5)) ())");
    }

    #[test]
    fn blocks_are_indented() {
        let storage = Storage::new();
        let id = storage.loop_id();
        let jump = LoopJump::new(JumpMode::Break, Some(id)).unwrap();
        let ir = [Instruction::Loop(Loop::new(id, vec![Instruction::LoopJump(jump)]))];

        let mut text = String::new();
        print_ir(&mut text, &ir).unwrap();
        assert_eq!(text, "(loop () () () () (\n    break\n))\n");
    }
}
