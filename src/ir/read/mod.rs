//! Reading IR from its textual form.
//!
//! The textual form is an S-expression per instruction, tagged by its leading
//! symbol:
//!
//! ```text
//! (declare (<qualifier> ...) <type> <name>)
//! (function <name> (signature <type> (parameters (declare ...) ...) (<instruction> ...)) ...)
//! (assign <condition | ()> (<write mask>?) <lhs> <rhs>)
//! (if <condition> (<instruction> ...) (<instruction> ...))
//! (loop (<counter>?) (<from>?) (<cmp> <to>)? (<increment>?) (<instruction> ...))
//! (return <rvalue>?)
//! break
//! continue
//! ```
//!
//! Rvalues are `(expression <type> <operator> <operand> <operand>?)`,
//! `(swiz <mask> <rvalue>)`, `(constant <type> (<value> ...))`,
//! `(var_ref <name>)`, `(array_ref <rvalue> <index>)`,
//! `(call <name> (<argument> ...))` and texture lookups:
//!
//! ```text
//! (tex <sampler> <coordinate> (<offset> <offset> <offset>) <projector | 1> (<comparator>?))
//! (txb ... <bias>)
//! (txl ... <lod>)
//! (txd ... (<dPdx> <dPdy>))
//! (txf <sampler> <coordinate> (<offset> <offset> <offset>) <lod>)
//! ```
//!
//! Types are names or `(array <type> <length>)`.
//!
//! Reading happens in two passes.  The first registers the signatures of
//! every top-level function, so that the second, which reads everything in
//! full, can resolve calls to functions defined later in the document.

use core::mem;

use rustc_hash::FxHashMap;

use crate::sexp::{self, Node};
use crate::storage::Storage;
use crate::tys::{BaseType, TypeRef};

use super::syms::{Prototype, SignatureProto};
use super::*;

mod err;

pub use err::{Error, ErrorKind, Result};

/// Options for reading IR.
#[derive(Copy, Clone, Debug)]
pub struct ReadOptions {
    /// Whether to register function signatures before reading bodies.
    ///
    /// Without this, a function can only be called after its definition.
    pub scan_for_prototypes: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { scan_for_prototypes: true }
    }
}

/// Read the IR of a compilation unit.
///
/// Global variables are bound in the innermost scope of `symbols`, as are
/// functions, including those nested in function bodies.  A function already
/// bound in `symbols`, by an earlier read, gains the signatures and bodies
/// read here.  On failure, nothing read is returned, though globals and
/// functions read before the failure stay bound.
pub fn read_ir<'c>(
    storage: &'c Storage<'c>,
    symbols: &mut SymbolTable<'c>,
    text: &str,
    options: ReadOptions,
) -> Result<Vec<Instruction<'c>>> {
    let nodes = sexp::read_expressions(text).map_err(|err| Error::new(
        ErrorKind::Syntax,
        format!("couldn't parse S-expression: {}", err)))?;

    let mut reader = Reader::new(storage, symbols, options);
    reader.read_document(document(&nodes))
}

/// The top-level instructions of a document.
///
/// A document may either list its instructions directly, or consist of a
/// single list of them.
fn document(nodes: &[Node]) -> &[Node] {
    match nodes {
        [Node::List(list)] if list.first().map_or(true, |n| n.as_symbol().is_none()) =>
            list,
        _ => nodes,
    }
}

/// The tags of the textual form.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Tag {
    Declare,
    Function,
    Signature,
    Parameters,
    Assign,
    If,
    Loop,
    Return,
    Expression,
    Swiz,
    Constant,
    VarRef,
    ArrayRef,
    RecordRef,
    Call,
    Tex,
    Txb,
    Txl,
    Txd,
    Txf,
    Array,
    Struct,
}

impl Tag {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "declare" => Self::Declare,
            "function" => Self::Function,
            "signature" => Self::Signature,
            "parameters" => Self::Parameters,
            "assign" => Self::Assign,
            "if" => Self::If,
            "loop" => Self::Loop,
            "return" => Self::Return,
            "expression" => Self::Expression,
            "swiz" => Self::Swiz,
            "constant" => Self::Constant,
            "var_ref" => Self::VarRef,
            "array_ref" => Self::ArrayRef,
            "record_ref" => Self::RecordRef,
            "call" => Self::Call,
            "tex" => Self::Tex,
            "txb" => Self::Txb,
            "txl" => Self::Txl,
            "txd" => Self::Txd,
            "txf" => Self::Txf,
            "array" => Self::Array,
            "struct" => Self::Struct,
            _ => return None,
        })
    }
}

/// A reader of IR for a single compilation unit.
struct Reader<'s, 'c> {
    storage: &'c Storage<'c>,
    symbols: &'s mut SymbolTable<'c>,
    options: ReadOptions,

    /// The name of the function whose body is being read.
    current_function: Option<&'c str>,

    /// The loops enclosing the current instruction, innermost last.
    loops: Vec<LoopId>,

    /// The depth of the scope functions are bound in.
    global_depth: usize,

    /// Every function read so far, in order of first appearance.
    ///
    /// The signatures of each are listed in the same order as those of its
    /// prototype in `symbols`.
    functions: Vec<Function<'c>>,

    /// The position of each function in `functions`.
    function_index: FxHashMap<&'c str, usize>,
}

/// A top-level item of a document, in document order.
enum Item<'c> {
    Instruction(Instruction<'c>),
    /// The function at the given position in `Reader::functions`.
    Function(usize),
}

impl<'s, 'c> Reader<'s, 'c> {
    fn new(
        storage: &'c Storage<'c>,
        symbols: &'s mut SymbolTable<'c>,
        options: ReadOptions,
    ) -> Self {
        let global_depth = symbols.depth();
        Self {
            storage,
            symbols,
            options,
            current_function: None,
            loops: Vec::new(),
            global_depth,
            functions: Vec::new(),
            function_index: FxHashMap::default(),
        }
    }

    /// Read every top-level instruction of a document.
    ///
    /// Instructions are returned in document order.  A function is placed
    /// where it first appears; one nested in a function body is placed after
    /// the top-level instruction containing it.
    fn read_document(&mut self, nodes: &[Node]) -> Result<Vec<Instruction<'c>>> {
        if self.options.scan_for_prototypes {
            log::debug!("scanning {} instructions for prototypes", nodes.len());
            self.scan_for_prototypes(nodes)?;
        }

        log::debug!("reading {} instructions", nodes.len());
        let mut items = Vec::with_capacity(nodes.len());
        let mut placed = vec![false; self.functions.len()];
        let mut seen = self.functions.len();
        for node in nodes {
            let top = match node {
                Node::List(list) if node.head() == Some("function") =>
                    Some(self.read_function(node, list, false)?),
                _ => {
                    items.extend(self.read_instruction(node)?.map(Item::Instruction));
                    None
                },
            };

            placed.resize(self.functions.len(), false);
            for slot in top.into_iter().chain(seen .. self.functions.len()) {
                if !mem::replace(&mut placed[slot], true) {
                    items.push(Item::Function(slot));
                }
            }
            seen = self.functions.len();
        }

        log::debug!("read {} top-level items, {} of them functions",
            items.len(), self.functions.len());
        let mut functions: Vec<_> = mem::take(&mut self.functions).into_iter()
            .map(Some)
            .collect();
        Ok(items.into_iter()
            .filter_map(|item| match item {
                Item::Instruction(i) => Some(i),
                Item::Function(slot) => functions[slot].take().map(Instruction::Function),
            })
            .collect())
    }

    /// Register the signature of every top-level function.
    fn scan_for_prototypes(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            if let Node::List(list) = node {
                if node.head() == Some("function") {
                    self.read_function(node, list, true)?;
                }
            }
        }

        Ok(())
    }

    /// Read a sequence of instructions.
    fn read_instructions(&mut self, node: &Node) -> Result<Vec<Instruction<'c>>> {
        let list = node.as_list().ok_or_else(|| self.error(
            ErrorKind::Malformed, node,
            "expected (<instruction> ...); found an atom"))?;

        let mut instructions = Vec::with_capacity(list.len());
        for node in list {
            instructions.extend(self.read_instruction(node)?);
        }
        Ok(instructions)
    }

    /// Read an instruction.
    ///
    /// Functions are collected separately, so nothing is returned for them.
    fn read_instruction(&mut self, node: &Node) -> Result<Option<Instruction<'c>>> {
        let list = match node {
            Node::Symbol(s) if s == "break" =>
                return self.read_jump(node, JumpMode::Break).map(Some),
            Node::Symbol(s) if s == "continue" =>
                return self.read_jump(node, JumpMode::Continue).map(Some),
            Node::List(list) if !list.is_empty() => list,
            _ => return Err(self.error(
                ErrorKind::Malformed, node, "invalid instruction")),
        };

        Ok(Some(match self.tag(node)? {
            Tag::Declare =>
                Instruction::Variable(self.read_declaration(node)?),
            Tag::Function => {
                self.read_function(node, list, false)?;
                return Ok(None);
            },
            Tag::Assign =>
                Instruction::Assignment(self.read_assignment(node, list)?),
            Tag::If =>
                Instruction::If(self.read_if(node, list)?),
            Tag::Loop =>
                Instruction::Loop(self.read_loop(node, list)?),
            Tag::Return =>
                Instruction::Return(self.read_return(node, list)?),
            Tag::Expression | Tag::Swiz | Tag::Constant | Tag::VarRef
            | Tag::ArrayRef | Tag::RecordRef | Tag::Call
            | Tag::Tex | Tag::Txb | Tag::Txl | Tag::Txd | Tag::Txf =>
                Instruction::Rvalue(self.read_rvalue(node)?),
            Tag::Signature | Tag::Parameters | Tag::Array | Tag::Struct =>
                return Err(self.error(
                    ErrorKind::Malformed, node, "invalid instruction")),
        }))
    }

    /// Read a `break` or `continue`.
    fn read_jump(&mut self, node: &Node, mode: JumpMode) -> Result<Instruction<'c>> {
        LoopJump::new(mode, self.loops.last().copied())
            .map(Instruction::LoopJump)
            .map_err(|err| self.error(ErrorKind::InvariantViolation, node, err))
    }

    /// Read a function, registering or completing its signatures.
    ///
    /// Returns the position of the function in `self.functions`.
    fn read_function(&mut self, node: &Node, list: &[Node], skip_body: bool) -> Result<usize> {
        if list.len() < 3 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (function <name> (signature ...) ...)"));
        }

        let name = list[1].as_symbol().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected (function <name> ...)"))?;
        let name = self.storage.intern(name);

        let slot = match self.function_index.get(name) {
            Some(&slot) => slot,
            None => {
                let mut function = Function::new(name);
                match self.symbols.get_function(name) {
                    Some(prototype) => {
                        log::debug!("function {} is already declared", name);
                        function.signatures = prototype.signatures.iter()
                            .map(SignatureProto::to_signature)
                            .collect();
                    },
                    None => {
                        let prototype = Prototype { name, signatures: Vec::new() };
                        self.symbols.add_function_at(self.global_depth, prototype);
                    },
                }
                self.functions.push(function);
                self.function_index.insert(name, self.functions.len() - 1);
                self.functions.len() - 1
            },
        };

        for sig in &list[2 ..] {
            match sig {
                Node::List(sig_list) if sig.head() == Some("signature") =>
                    self.read_signature(slot, sig, sig_list, skip_body)?,
                _ => return Err(self.error(
                    ErrorKind::Malformed, sig, "expected (signature ...)")),
            }
        }

        Ok(slot)
    }

    /// Read a signature of a function.
    ///
    /// A signature is matched against the prototype of the function by its
    /// parameter types, and registered if it is new.  Unless scanning for
    /// prototypes, the body is read too.
    fn read_signature(
        &mut self,
        slot: usize,
        node: &Node,
        list: &[Node],
        skip_body: bool,
    ) -> Result<()> {
        const SHAPE: &str =
            "expected (signature <type> (parameters ...) (<instruction> ...))";

        if list.len() != 4 {
            return Err(self.error(ErrorKind::Arity, node, SHAPE));
        }

        let return_type = self.read_type(&list[1])?;
        let params = match &list[2] {
            Node::List(params) => params,
            _ => return Err(self.error(ErrorKind::Malformed, node, SHAPE)),
        };
        if list[3].as_list().is_none() {
            return Err(self.error(ErrorKind::Malformed, node, SHAPE));
        }
        if list[2].head() != Some("parameters") {
            return Err(self.error(
                ErrorKind::Malformed, &list[2], "expected (parameters ...)"));
        }

        self.scoped(|this| {
            let parameters = params[1 ..].iter()
                .map(|p| this.read_declaration(p))
                .collect::<Result<Vec<_>>>()?;
            let types = parameters.iter().map(|p| p.ty).collect::<Vec<_>>();

            let name = this.functions[slot].name;
            let matched = this.prototype(name, node)?.matching_signature(&types);
            let index = match matched {
                Some(index) => {
                    let sig = &this.functions[slot].signatures[index];
                    let mismatch = sig.parameters.iter()
                        .zip(&parameters)
                        .find(|(a, b)| !same_qualifiers(a, b));
                    if let Some((_, param)) = mismatch {
                        let message = format!(
                            "function {} parameter {} qualifiers don't match prototype",
                            name, param.name);
                        return Err(this.error(ErrorKind::Malformed, node, message));
                    }

                    if sig.return_type != return_type {
                        let message = format!(
                            "function {} return type doesn't match prototype", name);
                        return Err(this.error(ErrorKind::Malformed, node, message));
                    }

                    index
                },
                None => {
                    this.functions[slot].signatures
                        .push(Signature::new(return_type, Vec::new()));
                    this.prototype(name, node)?.signatures.push(SignatureProto {
                        return_type,
                        parameters: Vec::new(),
                        is_defined: false,
                    });
                    this.functions[slot].signatures.len() - 1
                },
            };

            this.prototype(name, node)?.signatures[index].parameters = parameters.clone();
            this.functions[slot].signatures[index].parameters = parameters;

            let body = &list[3];
            if skip_body || body.is_empty_list() {
                return Ok(());
            }

            if this.functions[slot].signatures[index].is_defined {
                return Err(this.error(
                    ErrorKind::Malformed, node, format!("function {} redefined", name)));
            }

            let outer_function = this.current_function.replace(name);
            let outer_loops = mem::take(&mut this.loops);
            let instructions = this.read_instructions(body);
            this.loops = outer_loops;
            this.current_function = outer_function;
            let instructions = instructions?;

            this.prototype(name, node)?.signatures[index].is_defined = true;
            let sig = &mut this.functions[slot].signatures[index];
            sig.body = instructions;
            sig.is_defined = true;
            Ok(())
        })
    }

    /// The prototype of a function being read.
    fn prototype(&mut self, name: &str, node: &Node) -> Result<&mut Prototype<'c>> {
        let function = self.current_function;
        self.symbols.get_function_mut(name).ok_or_else(|| Error {
            kind: ErrorKind::InvariantViolation,
            message: format!("function {} is no longer in scope", name),
            function: function.map(str::to_owned),
            context: Some(node.to_string()),
        })
    }

    /// Read a variable declaration, binding it in the innermost scope.
    fn read_declaration(&mut self, node: &Node) -> Result<VarRef<'c>> {
        const SHAPE: &str = "expected (declare (<qualifiers>) <type> <name>)";

        let list = match node {
            Node::List(list) if node.head() == Some("declare") => list,
            _ => return Err(self.error(ErrorKind::Malformed, node, SHAPE)),
        };
        if list.len() != 4 {
            return Err(self.error(ErrorKind::Arity, node, SHAPE));
        }

        let quals = list[1].as_list().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected a list of variable qualifiers"))?;
        let ty = self.read_type(&list[2])?;
        let name = list[3].as_symbol().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected a variable name"))?;

        let mut var = Variable::new(self.storage.intern(name), ty);
        for qual in quals {
            let qual = qual.as_symbol().ok_or_else(|| self.error(
                ErrorKind::Malformed, node, "qualifier list must contain only symbols"))?;
            match qual {
                "centroid" => var.centroid = true,
                "invariant" => var.invariant = true,
                "auto" => var.mode = Mode::Auto,
                "uniform" => var.mode = Mode::Uniform,
                "in" => var.mode = Mode::In,
                "out" => var.mode = Mode::Out,
                "inout" => var.mode = Mode::InOut,
                "temporary" => var.mode = Mode::Temporary,
                "smooth" => var.interpolation = Interpolation::Smooth,
                "flat" => var.interpolation = Interpolation::Flat,
                "noperspective" => var.interpolation = Interpolation::NoPerspective,
                _ => return Err(self.error(ErrorKind::Malformed, node,
                    format!("unknown qualifier: {}", qual))),
            }
        }

        let var = self.storage.variable(var);
        self.symbols.add_variable(var);
        Ok(var)
    }

    /// Read a type.
    fn read_type(&mut self, node: &Node) -> Result<TypeRef<'c>> {
        let list = match node {
            Node::Symbol(name) => return self.symbols.get_type(name)
                .ok_or_else(|| self.error(ErrorKind::UnresolvedSymbol, node,
                    format!("invalid type: {}", name))),
            Node::List(list) => list,
            _ => return Err(self.error(ErrorKind::Malformed, node,
                "expected <type> (symbol or list)")),
        };

        match node.head().map(|h| (h, Tag::from_name(h))) {
            Some((_, Some(Tag::Array))) => {
                if list.len() != 3 {
                    return Err(self.error(ErrorKind::Arity, node,
                        "expected type (array <type> <int>)"));
                }

                let element = self.read_type(&list[1])?;
                let length = list[2].as_int()
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(|| self.error(ErrorKind::Malformed, node,
                        "expected a positive integer array size"))?;
                Ok(self.storage.get_array_instance(element, length))
            },
            Some((_, Some(Tag::Struct))) => Err(self.error(
                ErrorKind::UnsupportedFeature, node,
                "struct types are not yet supported")),
            Some((head, _)) => Err(self.error(ErrorKind::Malformed, node,
                format!("expected (array ...) or (struct ...); found ({} ...)", head))),
            None => Err(self.error(ErrorKind::Malformed, node,
                "expected type (array ...) or (struct ...)")),
        }
    }

    /// Read an assignment.
    fn read_assignment(&mut self, node: &Node, list: &[Node]) -> Result<Assignment<'c>> {
        if list.len() != 5 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (assign <condition> (<write mask>) <lhs> <rhs>)"));
        }

        let condition = match &list[1] {
            c if c.is_empty_list() => None,
            c => Some(self.read_rvalue(c)?),
        };

        let mask = match list[2].as_list() {
            Some([]) => "",
            Some([Node::Symbol(mask)]) => mask.as_str(),
            _ => return Err(self.error(ErrorKind::Malformed, &list[2],
                "expected () or (<write mask>)")),
        };

        let lhs = match self.read_rvalue(&list[3])? {
            Rvalue::Dereference(lhs) => lhs,
            _ => return Err(self.error(ErrorKind::Malformed, &list[3],
                "expected a dereference on the left-hand side")),
        };
        let rhs = self.read_rvalue(&list[4])?;

        Assignment::new(lhs, rhs, condition)
            .with_write_mask(mask)
            .map_err(|err| self.error(ErrorKind::Malformed, node, err))
    }

    /// Read a conditional.
    fn read_if(&mut self, node: &Node, list: &[Node]) -> Result<If<'c>> {
        if list.len() != 4 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (if <condition> (<then> ...) (<else> ...))"));
        }

        let condition = self.read_rvalue(&list[1])?;
        let then_instructions = self.read_instructions(&list[2])?;
        let else_instructions = self.read_instructions(&list[3])?;
        Ok(If { condition, then_instructions, else_instructions })
    }

    /// Read a loop.
    fn read_loop(&mut self, node: &Node, list: &[Node]) -> Result<Loop<'c>> {
        if list.len() != 6 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (loop <counter> <from> <to> <increment> <body>)"));
        }

        let counter = match self.loop_control(&list[1], 1)? {
            [] => None,
            [Node::Symbol(name)] => Some(self.symbols.get_variable(name)
                .ok_or_else(|| self.error(ErrorKind::UnresolvedSymbol, &list[1],
                    format!("undeclared variable: {}", name)))?),
            _ => return Err(self.error(ErrorKind::Malformed, &list[1],
                "expected (<counter variable>)")),
        };
        let from = match self.loop_control(&list[2], 1)? {
            [] => None,
            [x, ..] => Some(self.read_rvalue(x)?),
        };
        let to = match self.loop_control(&list[3], 2)? {
            [] => None,
            [Node::Symbol(cmp), x] => {
                let cmp = Operator::from_name(cmp)
                    .filter(|op| op.is_comparison())
                    .ok_or_else(|| self.error(ErrorKind::Malformed, &list[3],
                        format!("expected a comparison; found {}", cmp)))?;
                Some((cmp, self.read_rvalue(x)?))
            },
            _ => return Err(self.error(ErrorKind::Malformed, &list[3],
                "expected () or (<comparison> <rvalue>)")),
        };
        let increment = match self.loop_control(&list[4], 1)? {
            [] => None,
            [x, ..] => Some(self.read_rvalue(x)?),
        };

        let id = self.storage.loop_id();
        self.loops.push(id);
        let body = self.read_instructions(&list[5]);
        self.loops.pop();

        let mut result = Loop::new(id, body?);
        result.counter = counter;
        result.from = from;
        result.increment = increment;
        if let Some((cmp, to)) = to {
            result = result.with_terminator(cmp, to)
                .map_err(|err| self.error(ErrorKind::Malformed, node, err))?;
        }
        Ok(result)
    }

    /// The contents of a loop control: an empty list, or one with at most
    /// `max` elements.
    fn loop_control<'n>(&self, node: &'n Node, max: usize) -> Result<&'n [Node]> {
        match node.as_list() {
            Some(list) if list.len() <= max => Ok(list),
            _ => Err(self.error(ErrorKind::Malformed, node,
                "loop controls must be () or a list")),
        }
    }

    /// Read a return.
    fn read_return(&mut self, node: &Node, list: &[Node]) -> Result<Return<'c>> {
        match list {
            [_] => Ok(Return { value: None }),
            [_, value] => Ok(Return { value: Some(self.read_rvalue(value)?) }),
            _ => Err(self.error(ErrorKind::Arity, node,
                "expected (return) or (return <rvalue>)")),
        }
    }

    /// Read an rvalue.
    fn read_rvalue(&mut self, node: &Node) -> Result<Rvalue<'c>> {
        let list = match node {
            Node::List(list) if !list.is_empty() => list,
            _ => return Err(self.error(ErrorKind::Malformed, node,
                "expected (<rvalue> ...)")),
        };

        match self.tag(node)? {
            Tag::Expression => self.read_expression(node, list).map(Rvalue::from),
            Tag::Swiz => self.read_swizzle(node, list).map(Rvalue::from),
            Tag::Constant => self.read_constant(node, list).map(Rvalue::from),
            Tag::VarRef => self.read_var_ref(node, list).map(Rvalue::from),
            Tag::ArrayRef => self.read_array_ref(node, list).map(Rvalue::from),
            Tag::RecordRef => Err(self.error(ErrorKind::UnsupportedFeature, node,
                "record references are not yet supported")),
            Tag::Call => self.read_call(node, list).map(Rvalue::from),
            tag @ (Tag::Tex | Tag::Txb | Tag::Txl | Tag::Txd | Tag::Txf) =>
                self.read_texture(node, list, tag).map(Rvalue::from),
            _ => Err(self.error(ErrorKind::Malformed, node, "expected an rvalue")),
        }
    }

    /// Read an expression.
    fn read_expression(&mut self, node: &Node, list: &[Node]) -> Result<Expression<'c>> {
        if list.len() != 4 && list.len() != 5 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (expression <type> <operator> <operand> [<operand>])"));
        }

        let ty = self.read_type(&list[1])?;
        let name = list[2].as_symbol().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected an operator name"))?;
        let op = Operator::from_name(name).ok_or_else(|| self.error(
            ErrorKind::UnresolvedSymbol, node, format!("invalid operator: {}", name)))?;

        let operands = &list[3 ..];
        if operands.len() != op.arity() {
            return Err(self.error(ErrorKind::Arity, node, format!(
                "operator {} takes {} operand(s), found {}",
                op, op.arity(), operands.len())));
        }

        let operands = operands.iter()
            .map(|x| self.read_rvalue(x))
            .collect::<Result<Vec<_>>>()?;
        Expression::new(op, ty, operands)
            .map_err(|err| self.error(ErrorKind::Arity, node, err))
    }

    /// Read a swizzle.
    fn read_swizzle(&mut self, node: &Node, list: &[Node]) -> Result<Swizzle<'c>> {
        if list.len() != 3 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (swiz <field> <rvalue>)"));
        }

        let mask = list[1].as_symbol().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected a swizzle mask"))?;
        let mask = SwizzleMask::parse(mask)
            .map_err(|err| self.error(ErrorKind::Malformed, node, err))?;
        let value = self.read_rvalue(&list[2])?;
        Swizzle::new(value, mask)
            .map_err(|err| self.error(ErrorKind::Malformed, node, err))
    }

    /// Read a constant.
    fn read_constant(&mut self, node: &Node, list: &[Node]) -> Result<Constant<'c>> {
        if list.len() != 3 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (constant <type> (<value> ...))"));
        }

        let ty = self.read_type(&list[1])?;
        let values = list[2].as_list().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected (constant <type> (...))"))?;

        if ty.is_array() {
            let elements = values.iter()
                .map(|e| match e {
                    Node::List(elem) if e.head() == Some("constant") =>
                        self.read_constant(e, elem),
                    _ => Err(self.error(ErrorKind::Malformed, e,
                        "expected (constant <type> ...) for an array element")),
                })
                .collect::<Result<Vec<_>>>()?;
            return Constant::array(ty, elements)
                .map_err(|err| self.error(ErrorKind::Malformed, node, err));
        }

        if values.len() > Constant::MAX_COMPONENTS {
            return Err(self.error(ErrorKind::Malformed, node, format!(
                "expected at most {} values", Constant::MAX_COMPONENTS)));
        }

        let constant = match ty.base_type {
            BaseType::Float => {
                // Literals beyond the range of `f32` are rejected rather
                // than becoming infinite.
                let values = self.numbers(node, values, |x| x.as_number()
                    .map(|x| x as f32)
                    .filter(|x| x.is_finite()))?;
                Constant::float(ty, &values)
            },
            BaseType::Int => {
                let values = self.numbers(node, values,
                    |x| x.as_int().and_then(|x| i32::try_from(x).ok()))?;
                Constant::int(ty, &values)
            },
            BaseType::Uint => {
                let values = self.numbers(node, values,
                    |x| x.as_int().and_then(|x| u32::try_from(x).ok()))?;
                Constant::uint(ty, &values)
            },
            BaseType::Bool => {
                let values = self.numbers(node, values, |x| x.as_int().map(|x| x != 0))?;
                Constant::bool(ty, &values)
            },
            BaseType::Struct => return Err(self.error(
                ErrorKind::UnsupportedFeature, node,
                "struct constants are not yet supported")),
            _ => return Err(self.error(ErrorKind::Malformed, node,
                format!("cannot construct a constant of type {}", ty))),
        };

        constant.map_err(|err| self.error(ErrorKind::Malformed, node, err))
    }

    /// Convert the values of a constant.
    fn numbers<T>(
        &self,
        node: &Node,
        values: &[Node],
        convert: impl Fn(&Node) -> Option<T>,
    ) -> Result<Vec<T>> {
        values.iter()
            .map(|x| convert(x).ok_or_else(|| self.error(ErrorKind::Malformed, node,
                format!("invalid constant value {}", x))))
            .collect()
    }

    /// Read a reference to a variable.
    fn read_var_ref(&mut self, node: &Node, list: &[Node]) -> Result<Dereference<'c>> {
        let name = match list {
            [_, Node::Symbol(name)] => name,
            _ => return Err(self.error(ErrorKind::Arity, node,
                "expected (var_ref <variable name>)")),
        };

        let var = self.symbols.get_variable(name).ok_or_else(|| self.error(
            ErrorKind::UnresolvedSymbol, node, format!("undeclared variable: {}", name)))?;
        Dereference::variable(var)
            .map_err(|err| self.error(ErrorKind::Malformed, node, err))
    }

    /// Read a reference to an array element.
    fn read_array_ref(&mut self, node: &Node, list: &[Node]) -> Result<Dereference<'c>> {
        if list.len() != 3 {
            return Err(self.error(ErrorKind::Arity, node,
                "expected (array_ref <rvalue> <index>)"));
        }

        let array = self.read_rvalue(&list[1])?;
        let index = self.read_rvalue(&list[2])?;
        Dereference::array(array, index)
            .map_err(|err| self.error(ErrorKind::Malformed, node, err))
    }

    /// Read a call.
    fn read_call(&mut self, node: &Node, list: &[Node]) -> Result<Call<'c>> {
        const SHAPE: &str = "expected (call <name> (<argument> ...))";

        if list.len() != 3 {
            return Err(self.error(ErrorKind::Arity, node, SHAPE));
        }
        let (name, args) = match (&list[1], &list[2]) {
            (Node::Symbol(name), Node::List(args)) => (name, args),
            _ => return Err(self.error(ErrorKind::Malformed, node, SHAPE)),
        };

        let args = args.iter()
            .map(|a| self.read_rvalue(a))
            .collect::<Result<Vec<_>>>()?;
        let types = args.iter().map(|a| a.ty()).collect::<Vec<_>>();

        let function = self.symbols.get_function(name).ok_or_else(|| self.error(
            ErrorKind::UnresolvedSymbol, node,
            format!("found call to undefined function {}", name)))?;
        let signature = function.matching_signature(&types).ok_or_else(|| self.error(
            ErrorKind::UnresolvedSymbol, node,
            format!("couldn't find matching signature for function {}", name)))?;

        Ok(Call {
            callee: function.name,
            signature,
            ty: function.signatures[signature].return_type,
            args,
        })
    }

    /// Read a texture lookup.
    fn read_texture(&mut self, node: &Node, list: &[Node], tag: Tag) -> Result<Texture<'c>> {
        let (len, shape) = match tag {
            Tag::Tex => (6,
                "expected (tex <sampler> <coordinate> (<offsets>) <projector> <comparator>)"),
            Tag::Txf => (5,
                "expected (txf <sampler> <coordinate> (<offsets>) <lod>)"),
            _ => (7,
                "expected (<op> <sampler> <coordinate> (<offsets>) <projector> <comparator> <lod>)"),
        };
        if list.len() != len {
            return Err(self.error(ErrorKind::Arity, node, shape));
        }

        let sampler = match self.read_rvalue(&list[1])? {
            Rvalue::Dereference(sampler) => sampler,
            _ => return Err(self.error(ErrorKind::Malformed, &list[1],
                "expected a dereference of a sampler")),
        };
        let coordinate = self.read_rvalue(&list[2])?;

        let mut offsets = [0; 3];
        match list[3].as_list() {
            Some(values) if values.len() == 3 => {
                for (slot, value) in offsets.iter_mut().zip(values) {
                    *slot = value.as_int()
                        .and_then(|x| i8::try_from(x).ok())
                        .ok_or_else(|| self.error(ErrorKind::Malformed, &list[3],
                            format!("invalid texel offset {}", value)))?;
                }
            },
            _ => return Err(self.error(ErrorKind::Malformed, &list[3],
                "expected (<int> <int> <int>)")),
        }

        let op = match tag {
            Tag::Txf => TextureOp::Txf { lod: self.read_rvalue(&list[4])? },
            Tag::Txb => TextureOp::Txb { bias: self.read_rvalue(&list[6])? },
            Tag::Txl => TextureOp::Txl { lod: self.read_rvalue(&list[6])? },
            Tag::Txd => match list[6].as_list() {
                Some([dpdx, dpdy]) => TextureOp::Txd {
                    dpdx: self.read_rvalue(dpdx)?,
                    dpdy: self.read_rvalue(dpdy)?,
                },
                _ => return Err(self.error(ErrorKind::Malformed, &list[6],
                    "expected (<dPdx> <dPdy>) in (txd ...)")),
            },
            _ => TextureOp::Tex,
        };

        let mut texture = Texture::new(op, sampler, coordinate)
            .map_err(|err| self.error(ErrorKind::Malformed, node, err))?;
        texture.offsets = offsets;
        if tag == Tag::Txf {
            return Ok(texture);
        }

        texture.projector = match &list[4] {
            Node::Int(1) => None,
            projector => Some(self.read_rvalue(projector)?),
        };
        texture.shadow_comparator = match &list[5] {
            c if c.is_empty_list() => None,
            c @ Node::List(_) => Some(self.read_rvalue(c)?),
            c => return Err(self.error(ErrorKind::Malformed, c,
                "expected () or a shadow comparator")),
        };
        Ok(texture)
    }

    /// Decode the tag of a list.
    fn tag(&self, node: &Node) -> Result<Tag> {
        let head = node.as_list()
            .and_then(|l| l.first())
            .ok_or_else(|| self.error(ErrorKind::Malformed, node, "expected a tagged list"))?;
        let name = head.as_symbol().ok_or_else(|| self.error(
            ErrorKind::Malformed, node, "expected a tag"))?;
        Tag::from_name(name).ok_or_else(|| self.error(
            ErrorKind::UnknownTag, node, format!("unknown tag: {}", name)))
    }

    /// Run `f` in a new scope, leaving it even if `f` fails.
    fn scoped<T, F>(&mut self, f: F) -> Result<T>
    where F: FnOnce(&mut Self) -> Result<T> {
        self.symbols.push_scope();
        let result = f(self);
        self.symbols.pop_scope();
        result
    }

    /// Construct an error located at the given node.
    fn error(
        &self,
        kind: ErrorKind,
        node: &Node,
        message: impl ToString,
    ) -> Error {
        Error {
            kind,
            message: message.to_string(),
            function: self.current_function.map(str::to_owned),
            context: Some(node.to_string()),
        }
    }
}

/// Whether two parameters are declared with the same qualifiers.
fn same_qualifiers(a: &Variable<'_>, b: &Variable<'_>) -> bool {
    a.mode == b.mode
        && a.interpolation == b.interpolation
        && a.centroid == b.centroid
        && a.invariant == b.invariant
}

#[cfg(test)]
mod tests {
    use crate::tys::builtin::*;

    use super::*;

    fn read<'c>(storage: &'c Storage<'c>, text: &str) -> Result<Vec<Instruction<'c>>> {
        let mut symbols = SymbolTable::with_builtins();
        read_ir(storage, &mut symbols, text, ReadOptions::default())
    }

    fn kind(text: &str) -> ErrorKind {
        let storage = Storage::new();
        read(&storage, text).unwrap_err().kind
    }

    #[test]
    fn declarations_carry_qualifiers() {
        let storage = Storage::new();
        let ir = read(&storage,
            "(declare (centroid flat in) vec4 color)").unwrap();
        let [Instruction::Variable(var)] = &ir[..] else { panic!("{:?}", ir) };
        assert_eq!(var.name, "color");
        assert!(core::ptr::eq(var.ty, &VEC4));
        assert!(var.centroid && !var.invariant);
        assert_eq!(var.mode, Mode::In);
        assert_eq!(var.interpolation, Interpolation::Flat);
    }

    #[test]
    fn documents_may_be_a_single_list() {
        let storage = Storage::new();
        let ir = read(&storage,
            "((declare () float a) (declare () float b))").unwrap();
        assert_eq!(ir.len(), 2);
        assert!(read(&storage, "()").unwrap().is_empty());
    }

    #[test]
    fn error_kinds_are_distinguished() {
        assert_eq!(kind("(declare (uniform) float"), ErrorKind::Syntax);
        assert_eq!(kind("(declare (uniform) float)"), ErrorKind::Arity);
        assert_eq!(kind("(declare (bogus) float x)"), ErrorKind::Malformed);
        assert_eq!(kind("(declare () vec5 x)"), ErrorKind::UnresolvedSymbol);
        assert_eq!(kind("(declare () (struct ((float a))) s)"), ErrorKind::UnsupportedFeature);
        assert_eq!(kind("(frobnicate)"), ErrorKind::UnknownTag);
        assert_eq!(kind("(return (var_ref y))"), ErrorKind::UnresolvedSymbol);
        assert_eq!(kind("(return (record_ref (var_ref y) f))"), ErrorKind::UnsupportedFeature);
        assert_eq!(kind("(return (expression float + (constant float (1))))"), ErrorKind::Arity);
        assert_eq!(kind("(return (expression float frob (constant float (1))))"),
            ErrorKind::UnresolvedSymbol);
        assert_eq!(kind("break"), ErrorKind::InvariantViolation);
        assert_eq!(kind("42"), ErrorKind::Malformed);
    }

    #[test]
    fn failed_declarations_bind_nothing() {
        let storage = Storage::new();
        let mut symbols = SymbolTable::with_builtins();
        let err = read_ir(&storage, &mut symbols,
            "(declare (uniform) float)", ReadOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Arity);
        assert!(symbols.get_variable("float").is_none());
        assert_eq!(symbols.depth(), 1);
    }

    #[test]
    fn constants_are_checked() {
        let storage = Storage::new();
        assert!(read(&storage, "(return (constant vec2 (1 2.5)))").is_ok());
        assert!(read(&storage, "(return (constant ivec2 (1 -2)))").is_ok());
        assert_eq!(kind("(return (constant ivec2 (1 2.5)))"), ErrorKind::Malformed);
        assert_eq!(kind("(return (constant uint (-1)))"), ErrorKind::Malformed);
        assert_eq!(kind("(return (constant vec2 (1 2 3)))"), ErrorKind::Malformed);
        assert_eq!(kind("(return (constant mat4 (0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0)))"),
            ErrorKind::Malformed);

        let ok = "(return (constant (array float 2) \
                  ((constant float (1)) (constant float (2)))))";
        assert!(read(&storage, ok).is_ok());
        let short = "(return (constant (array float 2) ((constant float (1)))))";
        assert_eq!(kind(short), ErrorKind::Malformed);
    }

    #[test]
    fn errors_name_their_function_and_context() {
        let storage = Storage::new();
        let err = read(&storage, "(function main \
            (signature void (parameters) ((return (var_ref nope)))))")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedSymbol);
        assert_eq!(err.function.as_deref(), Some("main"));
        assert_eq!(err.context.as_deref(), Some("(var_ref nope)"));

        let text = err.to_string();
        assert!(text.starts_with("In function main:\nerror: undeclared variable: nope"));
        assert!(text.ends_with("...in this context:\n   (var_ref nope)"));
    }

    #[test]
    fn loops_read_their_controls() {
        let storage = Storage::new();
        let ir = read(&storage, "(declare () int i) \
            (loop (i) ((constant int (0))) (>= (constant int (4))) \
                  ((constant int (1))) (break))").unwrap();
        let Instruction::Loop(l) = &ir[1] else { panic!("{:?}", ir) };
        assert!(l.is_canonical());
        assert_eq!(l.cmp, Some(Operator::GEqual));
        let [Instruction::LoopJump(j)] = &l.body[..] else { panic!() };
        assert_eq!(j.target, l.id);

        let ir = read(&storage, "(loop () () () () ())").unwrap();
        let Instruction::Loop(l) = &ir[0] else { panic!() };
        assert!(l.is_bare());

        assert_eq!(kind("(loop () () (+ (constant int (1))) () ())"), ErrorKind::Malformed);
        assert_eq!(kind("(loop () () () ())"), ErrorKind::Arity);
    }

    #[test]
    fn jumps_target_the_innermost_loop() {
        let storage = Storage::new();
        let ir = read(&storage,
            "(loop () () () () ((loop () () () () (continue)) break))").unwrap();
        let Instruction::Loop(outer) = &ir[0] else { panic!() };
        let Instruction::Loop(inner) = &outer.body[0] else { panic!() };
        let Instruction::LoopJump(j) = &inner.body[0] else { panic!() };
        assert_eq!((j.mode, j.target), (JumpMode::Continue, inner.id));
        let Instruction::LoopJump(j) = &outer.body[1] else { panic!() };
        assert_eq!((j.mode, j.target), (JumpMode::Break, outer.id));
    }

    #[test]
    fn assignments_read_masks_and_conditions() {
        let storage = Storage::new();
        let ir = read(&storage, "(declare () vec4 v) \
            (assign () (xz) (var_ref v) (constant vec2 (1 2))) \
            (assign (constant bool (1)) () (var_ref v) (var_ref v))").unwrap();
        let Instruction::Assignment(a) = &ir[1] else { panic!() };
        assert!(a.condition.is_none());
        assert_eq!(a.write_mask, 0b0101);
        let Instruction::Assignment(b) = &ir[2] else { panic!() };
        assert!(b.condition.is_some());
        assert_eq!(b.write_mask, 0b1111);

        assert_eq!(kind("(declare () vec2 v) (assign () (xyz) (var_ref v) (var_ref v))"),
            ErrorKind::Malformed);
        assert_eq!(kind("(assign () () (constant float (1)) (constant float (1)))"),
            ErrorKind::Malformed);
    }

    #[test]
    fn instructions_keep_document_order() {
        let storage = Storage::new();
        let err = read(&storage, "(function main \
                (signature void (parameters) ((assign () () (var_ref g) (constant float (1)))))) \
            (declare (uniform) float g)").unwrap_err();
        // `g` is used before it is declared.
        assert_eq!(err.kind, ErrorKind::UnresolvedSymbol);

        let ir = read(&storage, "(declare (uniform) float g) \
            (function main (signature void (parameters) ())) \
            (declare (uniform) float h) \
            (function main (signature void (parameters (declare (in) int n)) ()))").unwrap();
        let [
            Instruction::Variable(g),
            Instruction::Function(main),
            Instruction::Variable(h),
        ] = &ir[..] else { panic!("{:?}", ir) };
        assert_eq!((g.name, main.name, h.name), ("g", "main", "h"));
        assert_eq!(main.signatures.len(), 2);
    }

    #[test]
    fn nested_functions_stay_callable() {
        let storage = Storage::new();
        let mut symbols = SymbolTable::with_builtins();
        let options = ReadOptions { scan_for_prototypes: false };
        let ir = read_ir(&storage, &mut symbols, "
            (function outer (signature void (parameters)
                ((function helper (signature float (parameters (declare (in) float x))
                    ((return (var_ref x))))))))
            (function helper (signature int (parameters (declare (in) int y))
                ((return (var_ref y)))))
            (function main (signature int (parameters)
                ((return (call helper ((constant int (1))))))))
        ", options).unwrap();

        let names: Vec<_> = ir.iter()
            .map(|i| match i {
                Instruction::Function(f) => f.name,
                _ => panic!("{:?}", i),
            })
            .collect();
        assert_eq!(names, ["outer", "helper", "main"]);

        let Instruction::Function(helper) = &ir[1] else { unreachable!() };
        let Instruction::Function(main) = &ir[2] else { unreachable!() };
        let [Instruction::Return(Return { value: Some(Rvalue::Call(call)) })] =
            &main.signatures[0].body[..] else { panic!("{:?}", main) };
        assert_eq!(call.signature, 1);
        assert!(core::ptr::eq(call.ty, &INT));
        assert!(core::ptr::eq(helper.signatures[call.signature].return_type, &INT));

        let prototype = symbols.get_function("helper").unwrap();
        assert_eq!(prototype.signatures.len(), helper.signatures.len());
        assert!(prototype.signatures.iter().all(|s| s.is_defined));
    }

    #[test]
    fn float_constants_must_fit() {
        let storage = Storage::new();
        assert_eq!(kind("(return (constant float (1e39)))"), ErrorKind::Malformed);
        assert_eq!(kind("(return (constant vec2 (1 -1e39)))"), ErrorKind::Malformed);
        assert!(read(&storage, "(return (constant float (3.4e38)))").is_ok());
    }

    #[test]
    fn textures_read_their_operands() {
        let storage = Storage::new();
        let ir = read(&storage, "
            (declare (uniform) sampler2DShadow s)
            (declare (uniform) isampler2D n)
            (declare (in) vec2 uv)
            (txl (var_ref s) (var_ref uv) (0 1 -2) (constant float (2))
                (constant float (0.5)) (constant float (0)))
            (txd (var_ref s) (var_ref uv) (0 0 0) 1 () ((var_ref uv) (var_ref uv)))
            (txf (var_ref n) (constant ivec2 (3 4)) (0 0 0) (constant int (0)))
        ").unwrap();

        let Instruction::Rvalue(Rvalue::Texture(txl)) = &ir[3] else { panic!("{:?}", ir) };
        assert!(core::ptr::eq(txl.ty, &FLOAT));
        assert_eq!(txl.offsets, [0, 1, -2]);
        assert!(txl.projector.is_some() && txl.shadow_comparator.is_some());
        assert!(matches!(txl.op, TextureOp::Txl { .. }));

        let Instruction::Rvalue(Rvalue::Texture(txd)) = &ir[4] else { panic!() };
        assert!(txd.projector.is_none() && txd.shadow_comparator.is_none());
        assert!(matches!(txd.op, TextureOp::Txd { .. }));

        let Instruction::Rvalue(Rvalue::Texture(txf)) = &ir[5] else { panic!() };
        assert!(core::ptr::eq(txf.ty, &IVEC4));

        let uv = "(declare (in) vec2 uv) (declare (uniform) sampler2D s) ";
        assert_eq!(kind(&format!("{}(tex (var_ref s) (var_ref uv) (0 0 0) 1)", uv)),
            ErrorKind::Arity);
        assert_eq!(kind(&format!("{}(tex (var_ref s) (var_ref uv) (0 0) 1 ())", uv)),
            ErrorKind::Malformed);
        assert_eq!(kind(&format!("{}(tex (var_ref s) (var_ref uv) (0 0 200) 1 ())", uv)),
            ErrorKind::Malformed);
        assert_eq!(kind(&format!("{}(tex (var_ref uv) (var_ref uv) (0 0 0) 1 ())", uv)),
            ErrorKind::Malformed);
        assert_eq!(kind(&format!("{}(txd (var_ref s) (var_ref uv) (0 0 0) 1 () (var_ref uv))", uv)),
            ErrorKind::Malformed);
    }

    #[test]
    fn redefinitions_are_rejected() {
        let sig = "(signature float (parameters (declare (in) float x)) \
                   ((return (var_ref x))))";
        let text = format!("(function f {}) (function f {})", sig, sig);
        assert_eq!(kind(&text), ErrorKind::Malformed);

        let text = "(function f (signature float (parameters) ())) \
                    (function f (signature int (parameters) ()))";
        assert_eq!(kind(text), ErrorKind::Malformed);
    }
}
