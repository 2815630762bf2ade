//! End-to-end inference over small programs.

use crate::ast::{AstBuilder, BinOp, Expr, ExprKind, NodeId, Program, Stmt, StmtKind, UnaryOp};
use crate::builtins::Globals;
use crate::error::{InferError, MalformedAst};
use crate::types::Type;

use super::*;

fn binding(map: &TypeMap, name: &str) -> Type {
    map.type_of_binding(map.global_scope(), name)
}

fn function_node(stmt: &Stmt) -> NodeId {
    match &stmt.kind {
        StmtKind::FunctionDecl(f) => f.id,
        other => panic!("not a function declaration: {:?}", other),
    }
}

fn function_expr_node(expr: &Expr) -> NodeId {
    match &expr.kind {
        ExprKind::Function(f) => f.id,
        other => panic!("not a function expression: {:?}", other),
    }
}

fn assign_stmt(b: &mut AstBuilder, target: Expr, value: Expr) -> Stmt {
    let assign = b.assign(target, value);
    b.expr_stmt(assign)
}

/// `Ctor.prototype.name = function () { body }`
fn define_method(b: &mut AstBuilder, ctor: &str, name: &str, body: Vec<Stmt>) -> Stmt {
    let ctor = b.ident(ctor);
    let proto = b.member(ctor, "prototype");
    let target = b.member(proto, name);
    let method = b.func_expr(None, &[], body);
    assign_stmt(b, target, method)
}

/// `var name = (function (params) { body })(args);`
fn iife(b: &mut AstBuilder, name: &str, params: &[&str], body: Vec<Stmt>, args: Vec<Expr>) -> Stmt {
    let function = b.func_expr(None, params, body);
    let call = b.call(function, args);
    b.var(name, call)
}

/// `function fact(n) { if (n <= 1) { return 1; } return n + fact(n - 1); }`
fn fact_program(b: &mut AstBuilder) -> (Program, NodeId) {
    let n = b.ident("n");
    let one = b.num(1.0);
    let test = b.binary(BinOp::LtEq, n, one);
    let one = b.num(1.0);
    let base = b.ret(one);
    let branch = b.if_stmt(test, vec![base], None);

    let n = b.ident("n");
    let fact = b.ident("fact");
    let n_again = b.ident("n");
    let one = b.num(1.0);
    let smaller = b.binary(BinOp::Sub, n_again, one);
    let recurse = b.call(fact, vec![smaller]);
    let sum = b.binary(BinOp::Add, n, recurse);
    let step = b.ret(sum);
    let decl = b.function_decl("fact", &["n"], vec![branch, step]);

    let fact = b.ident("fact");
    let five = b.num(5.0);
    let call = b.call(fact, vec![five]);
    let call_id = call.id;
    let result = b.var("result", call);
    (b.program(vec![decl, result]), call_id)
}

#[test]
fn test_identity_typed_per_call_site() {
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let ret = b.ret(a);
    let id_fn = b.function_decl("id", &["a"], vec![ret]);

    let id = b.ident("id");
    let five = b.num(5.0);
    let num_call = b.call(id, vec![five]);
    let num_call_id = num_call.id;
    let n = b.var("n", num_call);

    let id = b.ident("id");
    let text = b.str("text");
    let str_call = b.call(id, vec![text]);
    let str_call_id = str_call.id;
    let s = b.var("s", str_call);

    let map = infer_program(&b.program(vec![id_fn, n, s]));

    assert_eq!(map.type_of(num_call_id), Type::number());
    assert_eq!(map.type_of(str_call_id), Type::string());
    assert_eq!(binding(&map, "n"), Type::number());
    assert_eq!(binding(&map, "s"), Type::string());
    assert!(map.errors().is_empty());
}

#[test]
fn test_identity_declared_signature_joins_sites() {
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let ret = b.ret(a);
    let decl = b.function_decl("id", &["a"], vec![ret]);
    let id_node = function_node(&decl);
    let id = b.ident("id");
    let five = b.num(5.0);
    let first = b.call(id, vec![five]);
    let first = b.expr_stmt(first);
    let id = b.ident("id");
    let text = b.str("text");
    let second = b.call(id, vec![text]);
    let second = b.expr_stmt(second);

    let map = infer_program(&b.program(vec![decl, first, second]));
    let both = Type::union_of([Type::number(), Type::string()]);
    assert_eq!(
        map.signature_of(id_node),
        Type::func(vec![both.clone()], both)
    );
    assert_eq!(map.scopes_of(id_node).len(), 2);
    assert_eq!(
        map.binding_in(id_node, "a"),
        Type::union_of([Type::number(), Type::string()])
    );
}

#[test]
fn test_subtraction_is_numeric() {
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let one = b.num(1.0);
    let diff = b.binary(BinOp::Sub, a, one);
    let ret = b.ret(diff);
    let minus1 = b.func_expr(Some("minus1"), &["a"], vec![ret]);
    let minus1_node = function_expr_node(&minus1);
    let decl = b.var("minus1", minus1);

    let callee = b.ident("minus1");
    let three = b.num(3.0);
    let call = b.call(callee, vec![three]);
    let call_id = call.id;
    let result = b.var("result", call);

    let map = infer_program(&b.program(vec![decl, result]));
    assert_eq!(map.type_of(call_id), Type::number());
    assert_eq!(
        map.signature_of(minus1_node),
        Type::func(vec![Type::number()], Type::number())
    );
}

#[test]
fn test_field_widens_to_union() {
    let mut b = AstBuilder::new();
    let two = b.num(2.0);
    let literal = b.object(vec![("key", two)]);
    let decl = b.var("obj", literal);

    let obj = b.ident("obj");
    let target = b.member(obj, "key");
    let text = b.str("string");
    let write = assign_stmt(&mut b, target, text);

    let obj = b.ident("obj");
    let read = b.member(obj, "key");
    let read_id = read.id;
    let result = b.var("k", read);

    let map = infer_program(&b.program(vec![decl, write, result]));
    let both = Type::union_of([Type::number(), Type::string()]);
    assert_eq!(map.type_of(read_id), both);
    assert_eq!(binding(&map, "obj"), Type::object([("key", both)]));
}

#[test]
fn test_absent_field_then_written() {
    let mut b = AstBuilder::new();
    let literal = b.object(vec![]);
    let decl = b.var("obj", literal);

    let obj = b.ident("obj");
    let before = b.member(obj, "key");
    let before_id = before.id;
    let before = b.var("before", before);

    let obj = b.ident("obj");
    let target = b.member(obj, "key");
    let text = b.str("test");
    let write = assign_stmt(&mut b, target, text);

    let obj = b.ident("obj");
    let after = b.member(obj, "key");
    let after_id = after.id;
    let after = b.var("after", after);

    let map = infer_program(&b.program(vec![decl, before, write, after]));
    assert_eq!(map.type_of(before_id), Type::Unknown);
    assert_eq!(map.type_of(after_id), Type::string());
}

/// The output of TypeScript's class lowering: an `__extends` helper and
/// constructors wired up through prototypes.
#[test]
fn test_typescript_inheritance() {
    let mut b = AstBuilder::new();

    // var __extends = (this && this.__extends) || function (d, b) { ... };
    let this = b.this();
    let this_again = b.this();
    let existing = b.member(this_again, "__extends");
    let guard = b.binary(BinOp::And, this, existing);
    let helper = {
        let base = b.ident("b");
        let base_again = b.ident("b");
        let p = b.ident("p");
        let has_own = b.method_call(base_again, "hasOwnProperty", vec![p]);
        let d = b.ident("d");
        let p = b.ident("p");
        let slot = b.index(d, p);
        let base_again = b.ident("b");
        let p = b.ident("p");
        let value = b.index(base_again, p);
        let copy = assign_stmt(&mut b, slot, value);
        let copy_if = b.if_stmt(has_own, vec![copy], None);
        let copy_loop = b.for_in("p", base, vec![copy_if]);

        let this = b.this();
        let ctor_field = b.member(this, "constructor");
        let d = b.ident("d");
        let set_ctor = assign_stmt(&mut b, ctor_field, d);
        let intermediate = b.function_decl("__", &[], vec![set_ctor]);

        let inter = b.ident("__");
        let inter_proto = b.member(inter, "prototype");
        let base = b.ident("b");
        let base_proto = b.member(base, "prototype");
        let share = assign_stmt(&mut b, inter_proto, base_proto);

        let d = b.ident("d");
        let d_proto = b.member(d, "prototype");
        let inter = b.ident("__");
        let instance = b.new_expr(inter, vec![]);
        let link = assign_stmt(&mut b, d_proto, instance);

        b.func_expr(None, &["d", "b"], vec![copy_loop, intermediate, share, link])
    };
    let extends = b.binary(BinOp::Or, guard, helper);
    let extends = b.var("__extends", extends);

    // var Animal = (function () { function Animal(name) { this.name = name; } ... })();
    let this = b.this();
    let field = b.member(this, "name");
    let name = b.ident("name");
    let set_name = assign_stmt(&mut b, field, name);
    let animal_ctor = b.function_decl("Animal", &["name"], vec![set_name]);
    let animal_move = define_method(&mut b, "Animal", "move", vec![]);
    let value = b.num(123.0);
    let ret = b.ret(value);
    let animal_constant = define_method(&mut b, "Animal", "getConstant", vec![ret]);
    let animal = b.ident("Animal");
    let ret = b.ret(animal);
    let animal = iife(
        &mut b,
        "Animal",
        &[],
        vec![animal_ctor, animal_move, animal_constant, ret],
        vec![],
    );

    // var Snake = (function (_super) { __extends(Snake, _super); ... })(Animal);
    let callee = b.ident("__extends");
    let sub = b.ident("Snake");
    let sup = b.ident("_super");
    let wire = b.call(callee, vec![sub, sup]);
    let wire = b.expr_stmt(wire);
    let snake_ctor = b.function_decl("Snake", &["name"], vec![]);
    let snake_move = define_method(&mut b, "Snake", "move", vec![]);
    let value = b.str("string");
    let ret = b.ret(value);
    let snake_constant = define_method(&mut b, "Snake", "getConstant", vec![ret]);
    let snake = b.ident("Snake");
    let ret = b.ret(snake);
    let parent = b.ident("Animal");
    let snake = iife(
        &mut b,
        "Snake",
        &["_super"],
        vec![wire, snake_ctor, snake_move, snake_constant, ret],
        vec![parent],
    );

    // var Horse = (function (_super) { __extends(Horse, _super); ... })(Animal);
    let callee = b.ident("__extends");
    let sub = b.ident("Horse");
    let sup = b.ident("_super");
    let wire = b.call(callee, vec![sub, sup]);
    let wire = b.expr_stmt(wire);
    let horse_ctor = b.function_decl("Horse", &["name"], vec![]);
    let horse_move = define_method(&mut b, "Horse", "move", vec![]);
    let horse = b.ident("Horse");
    let ret = b.ret(horse);
    let parent = b.ident("Animal");
    let horse = iife(
        &mut b,
        "Horse",
        &["_super"],
        vec![wire, horse_ctor, horse_move, ret],
        vec![parent],
    );

    let ctor = b.ident("Snake");
    let label = b.str("Sammy the Python");
    let instance = b.new_expr(ctor, vec![label]);
    let sammy = b.var("snake", instance);
    let ctor = b.ident("Horse");
    let label = b.str("Tommy the Palomino");
    let instance = b.new_expr(ctor, vec![label]);
    let tommy = b.var("horse", instance);

    let receiver = b.ident("snake");
    let expect_string = b.method_call(receiver, "getConstant", vec![]);
    let expect_string_id = expect_string.id;
    let expect_string = b.var("expectString", expect_string);
    let receiver = b.ident("horse");
    let expect_number = b.method_call(receiver, "getConstant", vec![]);
    let expect_number_id = expect_number.id;
    let expect_number = b.var("expectNumber", expect_number);

    let program = b.program(vec![
        extends,
        animal,
        snake,
        horse,
        sammy,
        tommy,
        expect_string,
        expect_number,
    ]);
    let map = infer_program(&program);

    assert!(map.errors().is_empty(), "errors: {:?}", map.errors());
    assert_eq!(map.type_of(expect_string_id), Type::string());
    assert_eq!(map.type_of(expect_number_id), Type::number());

    let snake = map
        .constructors()
        .find(|(_, c)| c.name.as_deref() == Some("Snake"))
        .map(|(_, c)| c.clone())
        .expect("Snake constructor");
    let parent = snake.parent.and_then(|p| map.constructor_name(p));
    assert_eq!(parent, Some("Animal"));
    assert!(snake.methods.contains_key("getConstant"));
}

#[test]
fn test_factory_closures_do_not_interfere() {
    let mut b = AstBuilder::new();
    let v = b.ident("v");
    let inner_ret = b.ret(v);
    let inner = b.func_expr(None, &[], vec![inner_ret]);
    let ret = b.ret(inner);
    let factory = b.function_decl("factory", &["v"], vec![ret]);

    let callee = b.ident("factory");
    let num = b.num(123.0);
    let make_num = b.call(callee, vec![num]);
    let f1 = b.var("f1", make_num);
    let callee = b.ident("factory");
    let text = b.str("string");
    let make_str = b.call(callee, vec![text]);
    let f2 = b.var("f2", make_str);

    let callee = b.ident("f1");
    let call_num = b.call(callee, vec![]);
    let call_num_id = call_num.id;
    let r1 = b.var("r1", call_num);
    let callee = b.ident("f2");
    let call_str = b.call(callee, vec![]);
    let call_str_id = call_str.id;
    let r2 = b.var("r2", call_str);

    let map = infer_program(&b.program(vec![factory, f1, f2, r1, r2]));
    assert_eq!(map.type_of(call_num_id), Type::number());
    assert_eq!(map.type_of(call_str_id), Type::string());
    assert_eq!(binding(&map, "f1"), Type::func(vec![], Type::number()));
    assert_eq!(binding(&map, "f2"), Type::func(vec![], Type::string()));
}

#[test]
fn test_method_call_binds_this() {
    let mut b = AstBuilder::new();
    let this = b.this();
    let target = b.member(this, "count");
    let this = b.this();
    let current = b.member(this, "count");
    let one = b.num(1.0);
    let next = b.binary(BinOp::Add, current, one);
    let bump = assign_stmt(&mut b, target, next);
    let this = b.this();
    let count = b.member(this, "count");
    let ret = b.ret(count);
    let inc = b.func_expr(None, &[], vec![bump, ret]);
    let zero = b.num(0.0);
    let counter = b.object(vec![("count", zero), ("inc", inc)]);
    let decl = b.var("counter", counter);

    let receiver = b.ident("counter");
    let call = b.method_call(receiver, "inc", vec![]);
    let call_id = call.id;
    let result = b.var("c", call);

    let map = infer_program(&b.program(vec![decl, result]));
    assert_eq!(map.type_of(call_id), Type::number());
    assert_eq!(
        binding(&map, "counter"),
        Type::object([
            ("count", Type::number()),
            ("inc", Type::func(vec![], Type::number())),
        ])
    );
}

#[test]
fn test_call_binds_explicit_this() {
    let mut b = AstBuilder::new();
    let this = b.this();
    let name = b.member(this, "name");
    let ret = b.ret(name);
    let get_name = b.function_decl("getName", &[], vec![ret]);

    let callee = b.ident("getName");
    let text = b.str("x");
    let receiver = b.object(vec![("name", text)]);
    let call = b.method_call(callee, "call", vec![receiver]);
    let call_id = call.id;
    let who = b.var("who", call);

    let map = infer_program(&b.program(vec![get_name, who]));
    assert_eq!(map.type_of(call_id), Type::string());
}

#[test]
fn test_recursion_converges() {
    let mut b = AstBuilder::new();
    let (program, call_id) = fact_program(&mut b);
    let map = infer_program(&program);
    assert_eq!(map.type_of(call_id), Type::number());
    assert_eq!(binding(&map, "result"), Type::number());
}

#[test]
fn test_iteration_bound_freezes_at_unknown() {
    let mut b = AstBuilder::new();
    let (program, call_id) = fact_program(&mut b);
    let options = InferOptions::default().with_max_fixpoint_iterations(1);
    let map = infer_program_with(&program, &options, None);
    assert_eq!(map.type_of(call_id), Type::Unknown);
    assert!(map.errors().is_empty());
}

#[test]
fn test_self_returning_function_is_unknown() {
    let mut b = AstBuilder::new();
    let me = b.ident("recursive");
    let ret = b.ret(me);
    let function = b.func_expr(None, &[], vec![ret]);
    let function_id = function_expr_node(&function);
    let decl = b.var("recursive", function);
    let callee = b.ident("recursive");
    let call = b.call(callee, vec![]);
    let call_id = call.id;
    let result = b.var("r", call);

    let map = infer_program(&b.program(vec![decl, result]));
    assert_eq!(map.type_of(call_id), Type::Unknown);
    assert_eq!(
        map.signature_of(function_id),
        Type::func(vec![], Type::Unknown)
    );
}

#[test]
fn test_uncalled_self_returning_function_terminates() {
    let mut b = AstBuilder::new();
    let me = b.ident("recursive");
    let ret = b.ret(me);
    let function = b.func_expr(None, &[], vec![ret]);
    let decl = b.var("recursive", function);

    let map = infer_program(&b.program(vec![decl]));
    assert_eq!(
        binding(&map, "recursive"),
        Type::func(vec![], Type::Unknown)
    );
}

#[test]
fn test_uncalled_function_gets_signature() {
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let two = b.num(2.0);
    let half = b.binary(BinOp::Div, a, two);
    let ret = b.ret(half);
    let decl = b.function_decl("half", &["a"], vec![ret]);

    let map = infer_program(&b.program(vec![decl]));
    assert_eq!(
        binding(&map, "half"),
        Type::func(vec![Type::Unknown], Type::number())
    );
}

#[test]
fn test_malformed_statement_is_isolated() {
    let mut b = AstBuilder::new();
    let one = b.num(1.0);
    let first = b.var("a", one);
    let broken = b.call_without_callee(vec![]);
    let broken_id = broken.id;
    let second = b.var("b", broken);
    let text = b.str("x");
    let third = b.var("c", text);

    let map = infer_program(&b.program(vec![first, second, third]));
    assert_eq!(binding(&map, "a"), Type::number());
    assert_eq!(binding(&map, "c"), Type::string());
    assert_eq!(binding(&map, "b"), Type::Bottom);
    assert_eq!(map.errors().len(), 1);
    assert!(matches!(
        &map.errors()[0],
        InferError::Malformed(MalformedAst::MissingCallee { node, .. }) if *node == broken_id
    ));
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let mut b = AstBuilder::new();
    let one = b.num(1.0);
    let first = b.var("x", one);
    let copy = first.clone();
    let text = b.str("y");
    let other = b.var("y", text);

    let map = infer_program(&b.program(vec![first, copy, other]));
    assert_eq!(binding(&map, "x"), Type::number());
    assert_eq!(binding(&map, "y"), Type::string());
    assert_eq!(map.errors().len(), 1);
    assert!(matches!(
        map.errors()[0],
        InferError::Malformed(MalformedAst::DuplicateNodeId { .. })
    ));
}

#[test]
fn test_return_at_top_level_is_malformed() {
    let mut b = AstBuilder::new();
    let one = b.num(1.0);
    let ret = b.ret(one);
    let map = infer_program(&b.program(vec![ret]));
    assert!(matches!(
        map.errors(),
        [InferError::Malformed(MalformedAst::ReturnOutsideFunction { .. })]
    ));
}

#[test]
fn test_strict_unbound_records_names() {
    let mut b = AstBuilder::new();
    let missing = b.ident("missing");
    let one = b.num(1.0);
    let sum = b.binary(BinOp::Add, missing, one);
    let decl = b.var("y", sum);
    let program = b.program(vec![decl]);

    let lenient = infer_program(&program);
    assert_eq!(lenient.unbound_names().count(), 0);
    assert_eq!(binding(&lenient, "y"), Type::Unknown);

    let options = InferOptions::default().with_strict_unbound(true);
    let strict = infer_program_with(&program, &options, None);
    assert_eq!(strict.unbound_names().collect::<Vec<_>>(), vec!["missing"]);
    assert_eq!(binding(&strict, "y"), Type::Unknown);
}

#[test]
fn test_builtins_and_custom_globals() {
    let mut b = AstBuilder::new();
    let math = b.ident("Math");
    let random = b.method_call(math, "random", vec![]);
    let r = b.var("r", random);
    let config = b.ident("config");
    let debug = b.member(config, "debug");
    let d = b.var("d", debug);
    let program = b.program(vec![r, d]);

    let globals = Globals::empty().with("config", Type::object([("debug", Type::boolean())]));
    let map = infer_program_with(&program, &InferOptions::default(), Some(&globals));
    assert_eq!(binding(&map, "r"), Type::number());
    assert_eq!(binding(&map, "d"), Type::boolean());

    let names: Vec<&str> = map.globals().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["d", "r"]);

    let bare = infer_program_with(
        &program,
        &InferOptions::default().with_seed_builtins(false),
        None,
    );
    assert_eq!(binding(&bare, "r"), Type::Unknown);
}

#[test]
fn test_loop_and_catch_bindings() {
    let mut b = AstBuilder::new();
    let literal = b.object(vec![]);
    let keys = b.for_in("key", literal, vec![]);
    let problem = b.ident("problem");
    let rethrow = b.throw(problem);
    let text = b.str("x");
    let risky = b.throw(text);
    let guarded = b.try_catch(vec![risky], "err", vec![rethrow]);
    let counter = b.num(0.0);
    let i = b.var("i", counter);
    let target = b.ident("i");
    let bump = b.unary(UnaryOp::PostInc, target);
    let bump = b.expr_stmt(bump);
    let unset = b.var_decl("unset", None);

    let map = infer_program(&b.program(vec![keys, guarded, i, bump, unset]));
    assert_eq!(binding(&map, "key"), Type::string());
    assert_eq!(binding(&map, "err"), Type::Unknown);
    assert_eq!(binding(&map, "i"), Type::number());
    assert_eq!(binding(&map, "unset"), Type::Bottom);
}

#[test]
fn test_inference_is_deterministic() {
    let mut b = AstBuilder::new();
    let (program, _) = fact_program(&mut b);
    assert_eq!(infer_program(&program), infer_program(&program));
}

/// `function f() { var g = function () { f(); }; }`, optionally followed by
/// a top-level `f();`.
fn callback_program(b: &mut AstBuilder, call_outer: bool) -> (Program, NodeId, NodeId) {
    let callee = b.ident("f");
    let call = b.call(callee, vec![]);
    let call = b.expr_stmt(call);
    let g = b.func_expr(None, &[], vec![call]);
    let g_node = function_expr_node(&g);
    let decl = b.var("g", g);
    let f = b.function_decl("f", &[], vec![decl]);
    let f_node = function_node(&f);

    let mut statements = vec![f];
    if call_outer {
        let callee = b.ident("f");
        let call = b.call(callee, vec![]);
        statements.push(b.expr_stmt(call));
    }
    (b.program(statements), f_node, g_node)
}

#[test]
fn test_uncalled_callback_into_enclosing_function_terminates() {
    for call_outer in [false, true] {
        let mut b = AstBuilder::new();
        let (program, f_node, g_node) = callback_program(&mut b, call_outer);
        let map = infer_program(&program);

        let nothing = Type::func(vec![], Type::undefined());
        assert_eq!(map.signature_of(f_node), nothing, "call_outer = {}", call_outer);
        assert_eq!(map.signature_of(g_node), nothing, "call_outer = {}", call_outer);
        assert!(map.errors().is_empty());
    }
}

#[test]
fn test_uncalled_nested_closure_gets_signature() {
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let two = b.num(2.0);
    let double = b.binary(BinOp::Mul, a, two);
    let ret = b.ret(double);
    let inner = b.func_expr(None, &["a"], vec![ret]);
    let inner_node = function_expr_node(&inner);
    let decl = b.var("inner", inner);
    let outer = b.function_decl("outer", &[], vec![decl]);

    let map = infer_program(&b.program(vec![outer]));
    assert_eq!(
        map.signature_of(inner_node),
        Type::func(vec![Type::Unknown], Type::number())
    );
}

#[test]
fn test_access_on_unassigned_var_is_unknown() {
    let mut b = AstBuilder::new();
    let unset = b.var_decl("o", None);
    let o = b.ident("o");
    let read = b.member(o, "x");
    let read_id = read.id;
    let r = b.var("r", read);
    let o = b.ident("o");
    let call = b.call(o, vec![]);
    let call_id = call.id;
    let c = b.var("c", call);
    let o = b.ident("o");
    let method = b.method_call(o, "m", vec![]);
    let method_id = method.id;
    let m = b.var("m", method);
    let o = b.ident("o");
    let instance = b.new_expr(o, vec![]);
    let instance_id = instance.id;
    let n = b.var("n", instance);

    let map = infer_program(&b.program(vec![unset, r, c, m, n]));
    assert_eq!(binding(&map, "o"), Type::Bottom);
    assert_eq!(map.type_of(read_id), Type::Unknown);
    assert_eq!(map.type_of(call_id), Type::Unknown);
    assert_eq!(map.type_of(method_id), Type::Unknown);
    assert_eq!(map.type_of(instance_id), Type::Unknown);
}

#[test]
fn test_call_depth_bound_yields_unknown() {
    let mut b = AstBuilder::new();
    let one = b.num(1.0);
    let ret = b.ret(one);
    let inner = b.function_decl("inner", &[], vec![ret]);
    let callee = b.ident("inner");
    let call = b.call(callee, vec![]);
    let ret = b.ret(call);
    let outer = b.function_decl("outer", &[], vec![ret]);
    let callee = b.ident("outer");
    let call = b.call(callee, vec![]);
    let call_id = call.id;
    let result = b.var("r", call);
    let program = b.program(vec![inner, outer, result]);

    let shallow = InferOptions::default().with_max_call_depth(1);
    let map = infer_program_with(&program, &shallow, None);
    assert_eq!(map.type_of(call_id), Type::Unknown);
    assert_eq!(binding(&map, "r"), Type::Unknown);

    let map = infer_program(&program);
    assert_eq!(map.type_of(call_id), Type::number());
}

/// `function name(n) { if (n <= 0) { return flag; } return other(n - 1); }`
fn parity_function(b: &mut AstBuilder, name: &str, other: &str, flag: bool) -> Stmt {
    let n = b.ident("n");
    let zero = b.num(0.0);
    let test = b.binary(BinOp::LtEq, n, zero);
    let flag = b.bool(flag);
    let base = b.ret(flag);
    let branch = b.if_stmt(test, vec![base], None);
    let callee = b.ident(other);
    let n = b.ident("n");
    let one = b.num(1.0);
    let smaller = b.binary(BinOp::Sub, n, one);
    let call = b.call(callee, vec![smaller]);
    let step = b.ret(call);
    b.function_decl(name, &["n"], vec![branch, step])
}

#[test]
fn test_mutual_recursion_converges() {
    let mut b = AstBuilder::new();
    let even = parity_function(&mut b, "even", "odd", true);
    let odd = parity_function(&mut b, "odd", "even", false);
    let odd_node = function_node(&odd);
    let callee = b.ident("even");
    let four = b.num(4.0);
    let call = b.call(callee, vec![four]);
    let call_id = call.id;
    let result = b.var("r", call);

    let map = infer_program(&b.program(vec![even, odd, result]));
    assert_eq!(map.type_of(call_id), Type::boolean());
    assert_eq!(
        map.signature_of(odd_node),
        Type::func(vec![Type::number()], Type::boolean())
    );
}

#[test]
fn test_prototype_object_literal_supplies_methods() {
    let mut b = AstBuilder::new();
    // function Point() { this.x = 1; }
    let this = b.this();
    let field = b.member(this, "x");
    let one = b.num(1.0);
    let set_x = assign_stmt(&mut b, field, one);
    let point = b.function_decl("Point", &[], vec![set_x]);

    // Point.prototype = { getX: function () { return this.x; } };
    let ctor = b.ident("Point");
    let proto = b.member(ctor, "prototype");
    let this = b.this();
    let read_x = b.member(this, "x");
    let ret = b.ret(read_x);
    let get_x = b.func_expr(None, &[], vec![ret]);
    let literal = b.object(vec![("getX", get_x)]);
    let wire = assign_stmt(&mut b, proto, literal);

    let ctor = b.ident("Point");
    let instance = b.new_expr(ctor, vec![]);
    let p = b.var("p", instance);
    let receiver = b.ident("p");
    let call = b.method_call(receiver, "getX", vec![]);
    let call_id = call.id;
    let gx = b.var("gx", call);

    let map = infer_program(&b.program(vec![point, wire, p, gx]));
    assert_eq!(map.type_of(call_id), Type::number());
    let point = map
        .constructors()
        .find(|(_, c)| c.name.as_deref() == Some("Point"))
        .map(|(_, c)| c.clone())
        .expect("Point constructor");
    assert_eq!(
        point.methods.get("getX"),
        Some(&Type::func(vec![], Type::number()))
    );
}

#[test]
fn test_prototype_instance_links_parent() {
    let mut b = AstBuilder::new();
    // function Base() { this.kind = "base"; }
    let this = b.this();
    let field = b.member(this, "kind");
    let text = b.str("base");
    let set_kind = assign_stmt(&mut b, field, text);
    let base = b.function_decl("Base", &[], vec![set_kind]);

    // Base.prototype.describe = function () { return this.kind; };
    let this = b.this();
    let kind = b.member(this, "kind");
    let ret = b.ret(kind);
    let describe = define_method(&mut b, "Base", "describe", vec![ret]);

    // function Derived() {} Derived.prototype = new Base();
    let derived = b.function_decl("Derived", &[], vec![]);
    let ctor = b.ident("Derived");
    let proto = b.member(ctor, "prototype");
    let parent = b.ident("Base");
    let parent = b.new_expr(parent, vec![]);
    let link = assign_stmt(&mut b, proto, parent);

    let ctor = b.ident("Derived");
    let instance = b.new_expr(ctor, vec![]);
    let d = b.var("d", instance);
    let receiver = b.ident("d");
    let call = b.method_call(receiver, "describe", vec![]);
    let call_id = call.id;
    let k = b.var("k", call);
    let receiver = b.ident("d");
    let inherited = b.member(receiver, "kind");
    let inherited_id = inherited.id;
    let kind = b.var("kind", inherited);

    let map = infer_program(&b.program(vec![base, describe, derived, link, d, k, kind]));
    assert_eq!(map.type_of(call_id), Type::string());
    assert_eq!(map.type_of(inherited_id), Type::string());

    let derived = map
        .constructors()
        .find(|(_, c)| c.name.as_deref() == Some("Derived"))
        .map(|(_, c)| c.clone())
        .expect("Derived constructor");
    let parent = derived.parent.and_then(|p| map.constructor_name(p));
    assert_eq!(parent, Some("Base"));
}
