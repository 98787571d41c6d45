use shader_ir::ir::print::print_ir;
use shader_ir::ir::read::{read_ir, ReadOptions};
use shader_ir::ir::SymbolTable;
use shader_ir::storage::Storage;

const PROGRAM: &str = "
    (declare (uniform) vec4 tint)
    (declare (flat out) ivec2 cell)
    (declare (in) (array float 3) weights)
    (declare (uniform) sampler2D tex)
    (function scale
        (signature vec4 (parameters (declare (in) vec4 v) (declare (in) float k))
            ((return (expression vec4 * (var_ref v) (swiz xxxx (var_ref k)))))))
    (function main
        (signature void (parameters)
            ((declare (temporary) vec4 t)
             (declare () int i)
             (assign () () (var_ref t)
                (txb (var_ref tex) (swiz xy (var_ref t)) (0 1 0) 1 () (constant float (0.5))))
             (assign () (xyzw) (var_ref t)
                (call scale ((var_ref tint) (constant float (0.5)))))
             (loop (i) ((constant int (0))) (>= (constant int (3))) ((constant int (1)))
                ((assign () (x) (var_ref t)
                    (expression float +
                        (swiz x (var_ref t))
                        (array_ref (var_ref weights) (var_ref i))))))
             (if (expression bool < (swiz y (var_ref t)) (constant float (0)))
                ((assign () (yw) (var_ref t) (constant vec2 (1 -2.5))))
                ())
             (loop () () () ()
                ((assign (constant bool (1)) () (var_ref cell) (constant ivec2 (3 -4)))
                 break))
             (return))))
";

fn reprint(text: &str) -> String {
    let storage = Storage::new();
    let mut symbols = SymbolTable::with_builtins();
    let ir = read_ir(&storage, &mut symbols, text, ReadOptions::default())
        .unwrap_or_else(|err| panic!("{}\n\nwhile reading:\n{}", err, text));

    let mut output = String::new();
    print_ir(&mut output, &ir).unwrap();
    output
}

#[test]
fn printing_is_a_fixed_point() {
    let first = reprint(PROGRAM);
    let second = reprint(&first);
    assert_eq!(first, second);
}

#[test]
fn printing_keeps_operators_and_values() {
    let text = reprint(PROGRAM);
    assert!(text.starts_with("(declare (uniform) vec4 tint)\n\
                              (declare (flat out) ivec2 cell)\n\
                              (declare (in) (array float 3) weights)\n"));
    assert!(text.contains("(expression vec4 * (var_ref v) (swiz xxxx (var_ref k)))"));
    assert!(text.contains("(constant vec2 (1.0 -2.5))"));
    assert!(text.contains("(loop (i) ((constant int (0))) (>= (constant int (3))) \
                           ((constant int (1))) ("));
    assert!(text.contains("(assign (constant bool (1)) (xy) (var_ref cell) \
                           (constant ivec2 (3 -4)))"));
    assert!(text.contains("(declare (temporary) vec4 t)"));
    assert!(text.contains("(txb (var_ref tex) (swiz xy (var_ref t)) (0 1 0) 1 () \
                           (constant float (0.5)))"));
}

#[test]
fn shadowed_globals_keep_their_meaning() {
    let text = "
        (declare () vec4 g)
        (function f
            (signature float (parameters) ((return (swiz w (var_ref g))))))
        (declare () float g)
    ";

    let first = reprint(text);
    assert!(first.starts_with("(declare () vec4 g)\n(function f"));
    assert!(first.ends_with("(declare () float g)\n"));
    assert_eq!(first, reprint(&first));
}
