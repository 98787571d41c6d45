//! Traversal of IR.

use super::*;

pub trait Visit<'c> {
    fn visit_instructions(&mut self, i: &[Instruction<'c>]) {
        self::visit_instructions(self, i)
    }

    fn visit_instruction(&mut self, i: &Instruction<'c>) {
        self::visit_instruction(self, i)
    }

    fn visit_declaration(&mut self, i: VarRef<'c>) {
        let _ = i;
    }

    fn visit_function(&mut self, i: &Function<'c>) {
        self::visit_function(self, i)
    }

    fn visit_signature(&mut self, f: &Function<'c>, i: &Signature<'c>) {
        self::visit_signature(self, f, i)
    }

    fn visit_assignment(&mut self, i: &Assignment<'c>) {
        self::visit_assignment(self, i)
    }

    fn visit_return(&mut self, i: &Return<'c>) {
        self::visit_return(self, i)
    }

    fn visit_if(&mut self, i: &If<'c>) {
        self::visit_if(self, i)
    }

    fn visit_loop(&mut self, i: &Loop<'c>) {
        self::visit_loop(self, i)
    }

    fn visit_loop_jump(&mut self, i: &LoopJump) {
        let _ = i;
    }

    fn visit_rvalue(&mut self, i: &Rvalue<'c>) {
        self::visit_rvalue(self, i)
    }

    fn visit_expression(&mut self, i: &Expression<'c>) {
        self::visit_expression(self, i)
    }

    fn visit_swizzle(&mut self, i: &Swizzle<'c>) {
        self::visit_swizzle(self, i)
    }

    fn visit_dereference(&mut self, i: &Dereference<'c>) {
        self::visit_dereference(self, i)
    }

    fn visit_constant(&mut self, i: &Constant<'c>) {
        let _ = i;
    }

    fn visit_call(&mut self, i: &Call<'c>) {
        self::visit_call(self, i)
    }

    fn visit_texture(&mut self, i: &Texture<'c>) {
        self::visit_texture(self, i)
    }

    fn visit_variable(&mut self, i: VarRef<'c>) {
        let _ = i;
    }
}

pub fn visit_instructions<'c, V>(v: &mut V, i: &[Instruction<'c>])
where V: ?Sized + Visit<'c> {
    i.iter().for_each(|i| v.visit_instruction(i));
}

pub fn visit_instruction<'c, V>(v: &mut V, i: &Instruction<'c>)
where V: ?Sized + Visit<'c> {
    match i {
        Instruction::Variable(var) => v.visit_declaration(*var),
        Instruction::Function(f) => v.visit_function(f),
        Instruction::Assignment(a) => v.visit_assignment(a),
        Instruction::Return(r) => v.visit_return(r),
        Instruction::If(x) => v.visit_if(x),
        Instruction::Loop(l) => v.visit_loop(l),
        Instruction::LoopJump(j) => v.visit_loop_jump(j),
        Instruction::Rvalue(r) => v.visit_rvalue(r),
    }
}

pub fn visit_function<'c, V>(v: &mut V, i: &Function<'c>)
where V: ?Sized + Visit<'c> {
    i.signatures.iter().for_each(|s| v.visit_signature(i, s));
}

pub fn visit_signature<'c, V>(v: &mut V, f: &Function<'c>, i: &Signature<'c>)
where V: ?Sized + Visit<'c> {
    let _ = f;
    i.parameters.iter().for_each(|&p| v.visit_declaration(p));
    v.visit_instructions(&i.body);
}

pub fn visit_assignment<'c, V>(v: &mut V, i: &Assignment<'c>)
where V: ?Sized + Visit<'c> {
    if let Some(c) = &i.condition {
        v.visit_rvalue(c);
    }
    v.visit_dereference(&i.lhs);
    v.visit_rvalue(&i.rhs);
}

pub fn visit_return<'c, V>(v: &mut V, i: &Return<'c>)
where V: ?Sized + Visit<'c> {
    if let Some(x) = &i.value {
        v.visit_rvalue(x);
    }
}

pub fn visit_if<'c, V>(v: &mut V, i: &If<'c>)
where V: ?Sized + Visit<'c> {
    v.visit_rvalue(&i.condition);
    v.visit_instructions(&i.then_instructions);
    v.visit_instructions(&i.else_instructions);
}

pub fn visit_loop<'c, V>(v: &mut V, i: &Loop<'c>)
where V: ?Sized + Visit<'c> {
    if let Some(c) = i.counter {
        v.visit_variable(c);
    }
    [&i.from, &i.to, &i.increment].into_iter()
        .flatten()
        .for_each(|x| v.visit_rvalue(x));
    v.visit_instructions(&i.body);
}

pub fn visit_rvalue<'c, V>(v: &mut V, i: &Rvalue<'c>)
where V: ?Sized + Visit<'c> {
    match i {
        Rvalue::Expression(x) => v.visit_expression(x),
        Rvalue::Swizzle(x) => v.visit_swizzle(x),
        Rvalue::Dereference(x) => v.visit_dereference(x),
        Rvalue::Constant(x) => v.visit_constant(x),
        Rvalue::Call(x) => v.visit_call(x),
        Rvalue::Texture(x) => v.visit_texture(x),
    }
}

pub fn visit_expression<'c, V>(v: &mut V, i: &Expression<'c>)
where V: ?Sized + Visit<'c> {
    i.operands.iter().for_each(|x| v.visit_rvalue(x));
}

pub fn visit_swizzle<'c, V>(v: &mut V, i: &Swizzle<'c>)
where V: ?Sized + Visit<'c> {
    v.visit_rvalue(&i.value);
}

pub fn visit_dereference<'c, V>(v: &mut V, i: &Dereference<'c>)
where V: ?Sized + Visit<'c> {
    match i {
        Dereference::Variable(var) => v.visit_variable(*var),
        Dereference::Array { array, index, .. } => {
            v.visit_rvalue(array);
            v.visit_rvalue(index);
        },
        Dereference::Record { record, .. } => v.visit_rvalue(record),
    }
}

pub fn visit_call<'c, V>(v: &mut V, i: &Call<'c>)
where V: ?Sized + Visit<'c> {
    i.args.iter().for_each(|x| v.visit_rvalue(x));
}

pub fn visit_texture<'c, V>(v: &mut V, i: &Texture<'c>)
where V: ?Sized + Visit<'c> {
    v.visit_dereference(&i.sampler);
    v.visit_rvalue(&i.coordinate);
    [&i.projector, &i.shadow_comparator].into_iter()
        .flatten()
        .for_each(|x| v.visit_rvalue(x));
    match &i.op {
        TextureOp::Tex => {},
        TextureOp::Txb { bias: x } | TextureOp::Txl { lod: x } | TextureOp::Txf { lod: x } =>
            v.visit_rvalue(x),
        TextureOp::Txd { dpdx, dpdy } => {
            v.visit_rvalue(dpdx);
            v.visit_rvalue(dpdy);
        },
    }
}
