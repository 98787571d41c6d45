use shader_ir::ir::read::{read_ir, ErrorKind, ReadOptions};
use shader_ir::ir::{print, Instruction, Mode, Rvalue, SymbolTable};
use shader_ir::storage::Storage;
use shader_ir::tys::builtin::FLOAT;

const MUTUALLY_RECURSIVE: &str = "
    (function f
        (signature float (parameters (declare (in) float x))
            ((return (call g ((var_ref x)))))))
    (function g
        (signature float (parameters (declare (in) float x))
            ((return (call f ((var_ref x)))))))
";

#[test]
fn uniform_declaration_end_to_end() {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    let ir = read_ir(&storage, &mut symbols,
        "(declare (uniform) float x)", ReadOptions::default()).unwrap();

    let [Instruction::Variable(var)] = &ir[..] else { panic!("{:?}", ir) };
    assert_eq!(var.name, "x");
    assert!(core::ptr::eq(var.ty, &FLOAT));
    assert_eq!(var.mode, Mode::Uniform);
    assert_eq!(symbols.get_variable("x"), Some(*var));

    let mut text = String::new();
    print::print_ir(&mut text, &ir).unwrap();
    assert_eq!(text, "(declare (uniform) float x)\n");
}

#[test]
fn mutually_recursive_functions_resolve() {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    let ir = read_ir(&storage, &mut symbols,
        MUTUALLY_RECURSIVE, ReadOptions::default()).unwrap();

    let names: Vec<_> = ir.iter()
        .map(|i| match i {
            Instruction::Function(f) => f.name,
            _ => panic!("{:?}", i),
        })
        .collect();
    assert_eq!(names, ["f", "g"]);

    let Instruction::Function(f) = &ir[0] else { unreachable!() };
    let sig = &f.signatures[0];
    assert!(sig.is_defined);
    let [Instruction::Return(ret)] = &sig.body[..] else { panic!() };
    let Some(Rvalue::Call(call)) = &ret.value else { panic!() };
    assert_eq!(call.callee, "g");
    assert!(core::ptr::eq(call.ty, &FLOAT));
}

#[test]
fn forward_calls_need_the_prototype_scan() {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    let options = ReadOptions { scan_for_prototypes: false };
    let err = read_ir(&storage, &mut symbols, MUTUALLY_RECURSIVE, options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnresolvedSymbol);
    assert_eq!(err.function.as_deref(), Some("f"));
}

#[test]
fn failed_reads_leave_scopes_balanced() {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    symbols.push_scope();

    let text = "
        (function main
            (signature void (parameters (declare (in) int n))
                ((if (constant bool (1))
                    ((loop () () () () ((assign () () (var_ref missing) (var_ref n)))))
                    ()))))
    ";
    let err = read_ir(&storage, &mut symbols, text, ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnresolvedSymbol);
    assert_eq!(symbols.depth(), 2);
    assert!(symbols.get_variable("n").is_none());
}

#[test]
fn reader_errors_render_with_context() {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    let err = read_ir(&storage, &mut symbols,
        "(declare (uniform) float)", ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Arity);
    assert_eq!(err.to_string(),
        "error: expected (declare (<qualifiers>) <type> <name>)\n\
         ...in this context:\n   (declare (uniform) float)");
}

#[test]
fn later_reads_complete_earlier_prototypes() {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    let prototype = "(function f (signature float (parameters (declare (in) float x)) ()))";
    let ir = read_ir(&storage, &mut symbols, prototype, ReadOptions::default()).unwrap();
    let [Instruction::Function(f)] = &ir[..] else { panic!("{:?}", ir) };
    assert!(!f.signatures[0].is_defined);

    let body = "
        (function f
            (signature float (parameters (declare (in) float x)) ((return (var_ref x)))))
        (function g
            (signature float (parameters) ((return (call f ((constant float (1))))))))
    ";
    let ir = read_ir(&storage, &mut symbols, body, ReadOptions::default()).unwrap();
    let [Instruction::Function(f), Instruction::Function(g)] = &ir[..] else { panic!("{:?}", ir) };
    assert_eq!(f.signatures.len(), 1);
    assert!(f.signatures[0].is_defined);
    assert!(g.signatures[0].is_defined);
    assert!(symbols.get_function("f").unwrap().signatures[0].is_defined);

    let err = read_ir(&storage, &mut symbols, body, ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);
    assert_eq!(err.message, "function f redefined");
}
