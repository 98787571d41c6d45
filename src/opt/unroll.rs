//! Loop unrolling.

use crate::ir::{Cloner, Instruction, Loop};
use crate::storage::Storage;

use super::{LoopAnalysis, UnrollOptions};

/// Replace short loops by copies of their bodies.
///
/// A loop is unrolled when it is known to run at most
/// `options.max_iterations` times and its body has no jumps; it is replaced
/// by one independent copy of its body per iteration.  Nested loops are
/// considered before the loops containing them.  Returns whether anything
/// was unrolled.
///
/// Copies of loops nested inside an unrolled loop get fresh IDs, so the
/// analysis must be recomputed before running this again.
///
/// # Panics
///
/// Panics if `analysis` has no entry for a loop in `ir`.
pub fn unroll_loops<'c>(
    storage: &'c Storage<'c>,
    ir: &mut Vec<Instruction<'c>>,
    analysis: &LoopAnalysis,
    options: UnrollOptions,
) -> bool {
    let mut progress = false;
    let mut index = 0;
    while index < ir.len() {
        progress |= unroll_nested(storage, &mut ir[index], analysis, options);

        let copies = match &ir[index] {
            Instruction::Loop(l) => unroll_count(l, analysis, options)
                .map(|count| (0 .. count)
                    .flat_map(|_| Cloner::new(storage).clone_instructions(&l.body))
                    .collect::<Vec<_>>()),
            _ => None,
        };

        match copies {
            Some(copies) => {
                let len = copies.len();
                ir.splice(index ..= index, copies);
                index += len;
                progress = true;
            },
            None => index += 1,
        }
    }
    progress
}

/// Unroll the loops inside an instruction.
fn unroll_nested<'c>(
    storage: &'c Storage<'c>,
    i: &mut Instruction<'c>,
    analysis: &LoopAnalysis,
    options: UnrollOptions,
) -> bool {
    match i {
        Instruction::If(x) => {
            let then = unroll_loops(storage, &mut x.then_instructions, analysis, options);
            let r#else = unroll_loops(storage, &mut x.else_instructions, analysis, options);
            then || r#else
        },
        Instruction::Loop(l) => unroll_loops(storage, &mut l.body, analysis, options),
        Instruction::Function(f) => f.signatures.iter_mut()
            .fold(false, |progress, sig| {
                unroll_loops(storage, &mut sig.body, analysis, options) || progress
            }),
        _ => false,
    }
}

/// The number of copies to replace a loop by, if it should be unrolled.
fn unroll_count(l: &Loop<'_>, analysis: &LoopAnalysis, options: UnrollOptions) -> Option<u32> {
    let Some(info) = analysis.get(l.id) else {
        panic!("loop {:?} has no analysis entry", l.id);
    };

    let count = u32::try_from(info.max_iterations).ok()?;
    if count > options.max_iterations || info.num_loop_jumps != 0 {
        return None;
    }

    log::debug!("unrolling loop {:?} into {} copies of its body", l.id, count);
    Some(count)
}

#[cfg(test)]
mod tests {
    use crate::ir::{Dereference, If, Variable};
    use crate::opt::LoopInfo;
    use crate::tys::builtin::*;

    use super::*;

    #[test]
    fn nested_loops_unroll_first() {
        let storage = Storage::new();
        let outer = storage.loop_id();
        let inner = storage.loop_id();
        let x = storage.variable(Variable::new(storage.intern("x"), &BOOL));
        let cond = Dereference::variable(x).unwrap().into();

        let mut analysis = LoopAnalysis::new();
        analysis.insert(outer, LoopInfo { max_iterations: -1, num_loop_jumps: 0 });
        analysis.insert(inner, LoopInfo { max_iterations: 2, num_loop_jumps: 0 });

        let mut ir = vec![Instruction::Loop(Loop::new(outer, vec![
            Instruction::If(If {
                condition: cond,
                then_instructions: vec![Instruction::Loop(Loop::new(inner, vec![
                    Instruction::Variable(x),
                ]))],
                else_instructions: Vec::new(),
            }),
        ]))];

        assert!(unroll_loops(&storage, &mut ir, &analysis, UnrollOptions::default()));
        let Instruction::Loop(l) = &ir[0] else { panic!() };
        let Instruction::If(x) = &l.body[0] else { panic!() };
        assert_eq!(x.then_instructions.len(), 2);
        assert!(x.then_instructions.iter().all(|i| matches!(i, Instruction::Variable(_))));
    }

    #[test]
    fn zero_iterations_remove_the_loop() {
        let storage = Storage::new();
        let id = storage.loop_id();
        let mut analysis = LoopAnalysis::new();
        analysis.insert(id, LoopInfo { max_iterations: 0, num_loop_jumps: 0 });

        let x = storage.variable(Variable::new(storage.intern("x"), &FLOAT));
        let mut ir = vec![
            Instruction::Loop(Loop::new(id, vec![Instruction::Variable(x)])),
            Instruction::Variable(x),
        ];
        assert!(unroll_loops(&storage, &mut ir, &analysis, UnrollOptions::default()));
        assert_eq!(ir.len(), 1);
    }
}
