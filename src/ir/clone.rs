//! Deep cloning of IR.

use rustc_hash::FxHashMap;

use crate::storage::Storage;

use super::*;

/// Clones a region of IR so that the copy is independent of the original.
///
/// Variables declared inside the region are replaced by fresh variables, and
/// loops inside it by loops with fresh IDs; references and jumps to them are
/// redirected accordingly.  Everything declared outside the region is still
/// shared with the original.
pub struct Cloner<'c> {
    storage: &'c Storage<'c>,

    /// Replacements for variables declared in the region.
    variables: FxHashMap<VarRef<'c>, VarRef<'c>>,

    /// Replacements for loops in the region.
    loops: FxHashMap<LoopId, LoopId>,
}

impl<'c> Cloner<'c> {
    /// Construct a new [`Cloner`].
    pub fn new(storage: &'c Storage<'c>) -> Self {
        Self {
            storage,
            variables: FxHashMap::default(),
            loops: FxHashMap::default(),
        }
    }

    /// Clone a sequence of instructions.
    pub fn clone_instructions(
        &mut self,
        i: &[Instruction<'c>],
    ) -> Vec<Instruction<'c>> {
        i.iter().map(|i| self.clone_instruction(i)).collect()
    }

    /// Clone an instruction.
    pub fn clone_instruction(&mut self, i: &Instruction<'c>) -> Instruction<'c> {
        match i {
            Instruction::Variable(var) =>
                Instruction::Variable(self.declare(*var)),
            Instruction::Function(f) =>
                Instruction::Function(self.clone_function(f)),
            Instruction::Assignment(a) =>
                Instruction::Assignment(Assignment {
                    condition: a.condition.as_ref().map(|c| self.clone_rvalue(c)),
                    lhs: self.clone_dereference(&a.lhs),
                    rhs: self.clone_rvalue(&a.rhs),
                    write_mask: a.write_mask,
                }),
            Instruction::Return(r) =>
                Instruction::Return(Return {
                    value: r.value.as_ref().map(|x| self.clone_rvalue(x)),
                }),
            Instruction::If(x) =>
                Instruction::If(If {
                    condition: self.clone_rvalue(&x.condition),
                    then_instructions: self.clone_instructions(&x.then_instructions),
                    else_instructions: self.clone_instructions(&x.else_instructions),
                }),
            Instruction::Loop(l) =>
                Instruction::Loop(self.clone_loop(l)),
            Instruction::LoopJump(j) =>
                Instruction::LoopJump(LoopJump {
                    mode: j.mode,
                    target: self.loops.get(&j.target).copied().unwrap_or(j.target),
                }),
            Instruction::Rvalue(r) =>
                Instruction::Rvalue(self.clone_rvalue(r)),
        }
    }

    fn clone_function(&mut self, f: &Function<'c>) -> Function<'c> {
        let signatures = f.signatures.iter()
            .map(|s| Signature {
                return_type: s.return_type,
                parameters: s.parameters.iter().map(|&p| self.declare(p)).collect(),
                body: self.clone_instructions(&s.body),
                is_defined: s.is_defined,
            })
            .collect();
        Function { name: f.name, signatures }
    }

    fn clone_loop(&mut self, l: &Loop<'c>) -> Loop<'c> {
        let id = self.storage.loop_id();
        self.loops.insert(l.id, id);
        Loop {
            id,
            counter: l.counter.map(|c| self.variable(c)),
            from: l.from.as_ref().map(|x| self.clone_rvalue(x)),
            to: l.to.as_ref().map(|x| self.clone_rvalue(x)),
            increment: l.increment.as_ref().map(|x| self.clone_rvalue(x)),
            cmp: l.cmp,
            body: self.clone_instructions(&l.body),
        }
    }

    /// Clone an rvalue.
    pub fn clone_rvalue(&mut self, i: &Rvalue<'c>) -> Rvalue<'c> {
        match i {
            Rvalue::Expression(x) => Rvalue::from(Expression {
                op: x.op,
                ty: x.ty,
                operands: x.operands.iter().map(|o| self.clone_rvalue(o)).collect(),
            }),
            Rvalue::Swizzle(x) => Rvalue::from(Swizzle {
                value: self.clone_rvalue(&x.value),
                mask: x.mask,
                ty: x.ty,
            }),
            Rvalue::Dereference(x) => Rvalue::from(self.clone_dereference(x)),
            Rvalue::Constant(x) => Rvalue::Constant(x.clone()),
            Rvalue::Call(x) => Rvalue::from(Call {
                callee: x.callee,
                signature: x.signature,
                ty: x.ty,
                args: x.args.iter().map(|a| self.clone_rvalue(a)).collect(),
            }),
            Rvalue::Texture(x) => Rvalue::from(self.clone_texture(x)),
        }
    }

    fn clone_texture(&mut self, i: &Texture<'c>) -> Texture<'c> {
        let op = match &i.op {
            TextureOp::Tex => TextureOp::Tex,
            TextureOp::Txb { bias } => TextureOp::Txb { bias: self.clone_rvalue(bias) },
            TextureOp::Txl { lod } => TextureOp::Txl { lod: self.clone_rvalue(lod) },
            TextureOp::Txd { dpdx, dpdy } => TextureOp::Txd {
                dpdx: self.clone_rvalue(dpdx),
                dpdy: self.clone_rvalue(dpdy),
            },
            TextureOp::Txf { lod } => TextureOp::Txf { lod: self.clone_rvalue(lod) },
        };

        Texture {
            op,
            ty: i.ty,
            sampler: self.clone_dereference(&i.sampler),
            coordinate: self.clone_rvalue(&i.coordinate),
            offsets: i.offsets,
            projector: i.projector.as_ref().map(|x| self.clone_rvalue(x)),
            shadow_comparator: i.shadow_comparator.as_ref().map(|x| self.clone_rvalue(x)),
        }
    }

    fn clone_dereference(&mut self, i: &Dereference<'c>) -> Dereference<'c> {
        match i {
            Dereference::Variable(var) => Dereference::Variable(self.variable(*var)),
            Dereference::Array { array, index, ty } => Dereference::Array {
                array: Box::new(self.clone_rvalue(array)),
                index: Box::new(self.clone_rvalue(index)),
                ty: *ty,
            },
            Dereference::Record { record, field, ty } => Dereference::Record {
                record: Box::new(self.clone_rvalue(record)),
                field: *field,
                ty: *ty,
            },
        }
    }

    /// Replace a declared variable with a fresh copy.
    fn declare(&mut self, var: VarRef<'c>) -> VarRef<'c> {
        let fresh = self.storage.variable(var.get().clone());
        self.variables.insert(var, fresh);
        fresh
    }

    /// The replacement for a variable, if it has one.
    fn variable(&self, var: VarRef<'c>) -> VarRef<'c> {
        self.variables.get(&var).copied().unwrap_or(var)
    }
}

#[cfg(test)]
mod tests {
    use crate::tys::builtin::*;

    use super::*;

    #[test]
    fn declared_variables_are_renewed() {
        let storage = Storage::new();
        let outer = storage.variable(Variable::new(storage.intern("o"), &FLOAT));
        let inner = storage.variable(Variable::new(storage.intern("i"), &FLOAT));

        let region = vec![
            Instruction::Variable(inner),
            Instruction::Assignment(Assignment::new(
                Dereference::variable(inner).unwrap(),
                Dereference::variable(outer).unwrap().into(),
                None)),
        ];

        let copy = Cloner::new(&storage).clone_instructions(&region);
        let Instruction::Variable(fresh) = &copy[0] else { panic!() };
        let fresh = *fresh;
        assert_ne!(fresh, inner);
        assert_eq!(fresh.name, "i");

        let Instruction::Assignment(a) = &copy[1] else { panic!() };
        assert_eq!(a.lhs.root_variable(), Some(fresh));
        let Rvalue::Dereference(rhs) = &a.rhs else { panic!() };
        assert_eq!(rhs.root_variable(), Some(outer));
    }

    #[test]
    fn texture_operands_are_remapped() {
        let storage = Storage::new();
        let s = storage.variable(Variable::new(storage.intern("s"), &SAMPLER2D));
        let uv = storage.variable(Variable::new(storage.intern("uv"), &VEC2));
        let bias = Rvalue::from(Dereference::variable(uv).unwrap());
        let tex = Texture::new(
            TextureOp::Txb { bias: Swizzle::new(bias, SwizzleMask::parse("x").unwrap())
                .unwrap().into() },
            Dereference::variable(s).unwrap(),
            Dereference::variable(uv).unwrap().into(),
        ).unwrap();
        let region = vec![
            Instruction::Variable(uv),
            Instruction::Rvalue(tex.into()),
        ];

        let copy = Cloner::new(&storage).clone_instructions(&region);
        let Instruction::Variable(fresh) = &copy[0] else { panic!() };
        let Instruction::Rvalue(Rvalue::Texture(t)) = &copy[1] else { panic!() };
        assert_eq!(t.sampler.root_variable(), Some(s));
        let Rvalue::Dereference(coordinate) = &t.coordinate else { panic!() };
        assert_eq!(coordinate.root_variable(), Some(*fresh));
        let TextureOp::Txb { bias: Rvalue::Swizzle(bias) } = &t.op else { panic!() };
        let Rvalue::Dereference(bias) = &bias.value else { panic!() };
        assert_eq!(bias.root_variable(), Some(*fresh));
    }

    #[test]
    fn nested_loops_get_fresh_ids() {
        let storage = Storage::new();
        let id = storage.loop_id();
        let jump = LoopJump::new(JumpMode::Break, Some(id)).unwrap();
        let region = vec![Instruction::Loop(Loop::new(id, vec![
            Instruction::LoopJump(jump),
        ]))];

        let copy = Cloner::new(&storage).clone_instructions(&region);
        let Instruction::Loop(l) = &copy[0] else { panic!() };
        assert_ne!(l.id, id);
        let Instruction::LoopJump(j) = &l.body[0] else { panic!() };
        assert_eq!(j.target, l.id);
    }
}
