use std::cell::RefCell;

use crate::{
    diagnostics::{Diagnostic, Result, RuntimeErrorKind},
    runtime::Interpreter,
    value::Value,
};

/// Register the builtin functions as globals on a fresh interpreter.
pub fn install(interpreter: &mut Interpreter) {
    // io
    interpreter.register_native("print", 0, None, io_print);
    interpreter.register_native("println", 0, None, io_println);

    // math
    interpreter.register_native("cos", 1, Some(1), math_cos);
    interpreter.register_native("sin", 1, Some(1), math_sin);
    interpreter.register_native("tan", 1, Some(1), math_tan);
    interpreter.register_native("acos", 1, Some(1), math_acos);
    interpreter.register_native("asin", 1, Some(1), math_asin);
    interpreter.register_native("atan", 1, Some(1), math_atan);
    interpreter.register_native("atan2", 2, Some(2), math_atan2);
    interpreter.register_native("cosh", 1, Some(1), math_cosh);
    interpreter.register_native("sinh", 1, Some(1), math_sinh);
    interpreter.register_native("tanh", 1, Some(1), math_tanh);
    interpreter.register_native("acosh", 1, Some(1), math_acosh);
    interpreter.register_native("asinh", 1, Some(1), math_asinh);
    interpreter.register_native("atanh", 1, Some(1), math_atanh);
    interpreter.register_native("exp", 1, Some(1), math_exp);
    interpreter.register_native("exp2", 1, Some(1), math_exp2);
    interpreter.register_native("expm1", 1, Some(1), math_expm1);
    interpreter.register_native("ldexp", 2, Some(2), math_ldexp);
    interpreter.register_native("log", 1, Some(1), math_log);
    interpreter.register_native("log2", 1, Some(1), math_log2);
    interpreter.register_native("log10", 1, Some(1), math_log10);
    interpreter.register_native("ilogb", 1, Some(1), math_ilogb);
    interpreter.register_native("log1p", 1, Some(1), math_log1p);
    interpreter.register_native("logb", 1, Some(1), math_logb);
    interpreter.register_native("scalbn", 2, Some(2), math_scalbn);
    interpreter.register_native("pow", 2, Some(2), math_pow);
    interpreter.register_native("sqrt", 1, Some(1), math_sqrt);
    interpreter.register_native("cbrt", 1, Some(1), math_cbrt);
    interpreter.register_native("hypot", 2, Some(2), math_hypot);
    interpreter.register_native("floor", 1, Some(1), math_floor);
    interpreter.register_native("ceil", 1, Some(1), math_ceil);

    // string
    interpreter.register_native("strlen", 1, Some(1), string_strlen);
    interpreter.register_native("strstr", 2, Some(2), string_strstr);
    interpreter.register_native("substr", 3, Some(3), string_substr);

    // collections
    interpreter.register_native("length", 1, Some(1), collections_length);
    interpreter.register_native("find", 2, Some(2), collections_find);
    interpreter.register_native("map", 2, Some(2), collections_map);
    interpreter.register_native("filter", 2, Some(2), collections_filter);
    interpreter.register_native("reduce", 2, Some(2), collections_reduce);
    interpreter.register_native("range", 2, Some(2), collections_range);
}

fn type_error(message: String) -> Diagnostic {
    Diagnostic::runtime(RuntimeErrorKind::Type, message)
}

fn expect_number(value: &Value, name: &str) -> Result<f64> {
    match value.as_number() {
        Some(number) => Ok(number),
        None => Err(type_error(format!(
            "`{name}` expected a number, got {}",
            value.type_name()
        ))
        .into()),
    }
}

fn expect_str<'a>(value: &'a Value, name: &str) -> Result<&'a str> {
    match value.as_str() {
        Some(text) => Ok(text),
        None => Err(type_error(format!(
            "`{name}` expected a string, got {}",
            value.type_name()
        ))
        .into()),
    }
}

fn expect_array<'a>(value: &'a Value, name: &str) -> Result<&'a RefCell<Vec<Value>>> {
    match value.as_array() {
        Some(values) => Ok(values),
        None => Err(type_error(format!(
            "`{name}` expected an array, got {}",
            value.type_name()
        ))
        .into()),
    }
}

/// `print` renders strings raw and everything else in dump form, separated
/// by single spaces.
fn io_print(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            print!(" ");
        }
        match arg.as_str() {
            Some(text) => print!("{text}"),
            None => print!("{arg}"),
        }
    }
    Ok(Value::Nil)
}

fn io_println(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    io_print(interpreter, args)?;
    println!();
    Ok(Value::Nil)
}

macro_rules! unary_math {
    ($($func:ident => ($name:literal, $method:ident)),* $(,)?) => {
        $(
            fn $func(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
                let number = expect_number(&args[0], $name)?;
                Ok(Value::number(number.$method()))
            }
        )*
    };
}

unary_math! {
    math_cos => ("cos", cos),
    math_sin => ("sin", sin),
    math_tan => ("tan", tan),
    math_acos => ("acos", acos),
    math_asin => ("asin", asin),
    math_atan => ("atan", atan),
    math_cosh => ("cosh", cosh),
    math_sinh => ("sinh", sinh),
    math_tanh => ("tanh", tanh),
    math_acosh => ("acosh", acosh),
    math_asinh => ("asinh", asinh),
    math_atanh => ("atanh", atanh),
    math_exp => ("exp", exp),
    math_exp2 => ("exp2", exp2),
    math_expm1 => ("expm1", exp_m1),
    math_log => ("log", ln),
    math_log2 => ("log2", log2),
    math_log10 => ("log10", log10),
    math_log1p => ("log1p", ln_1p),
    math_sqrt => ("sqrt", sqrt),
    math_cbrt => ("cbrt", cbrt),
    math_floor => ("floor", floor),
    math_ceil => ("ceil", ceil),
}

fn math_atan2(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let y = expect_number(&args[0], "atan2")?;
    let x = expect_number(&args[1], "atan2")?;
    Ok(Value::number(y.atan2(x)))
}

fn math_pow(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let base = expect_number(&args[0], "pow")?;
    let exponent = expect_number(&args[1], "pow")?;
    Ok(Value::number(base.powf(exponent)))
}

fn math_hypot(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let x = expect_number(&args[0], "hypot")?;
    let y = expect_number(&args[1], "hypot")?;
    Ok(Value::number(x.hypot(y)))
}

fn math_ldexp(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "ldexp")?;
    let exponent = expect_number(&args[1], "ldexp")?;
    Ok(Value::number(number * 2f64.powi(exponent as i32)))
}

fn math_scalbn(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "scalbn")?;
    let exponent = expect_number(&args[1], "scalbn")?;
    Ok(Value::number(number * 2f64.powi(exponent as i32)))
}

/// Binary exponent of the value, like C's `ilogb`.
fn math_ilogb(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "ilogb")?;
    Ok(Value::number(number.abs().log2().floor()))
}

fn math_logb(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "logb")?;
    Ok(Value::number(number.abs().log2().floor()))
}

fn string_strlen(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strlen")?;
    Ok(Value::number(text.chars().count() as f64))
}

fn string_strstr(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let haystack = expect_str(&args[0], "strstr")?;
    let needle = expect_str(&args[1], "strstr")?;
    Ok(Value::bool(haystack.contains(needle)))
}

/// `substr(text, begin, count)` slices `count` characters starting at
/// character `begin`. Both positions are character-addressed, never byte
/// offsets.
fn string_substr(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "substr")?;
    let begin = expect_number(&args[1], "substr")?.trunc();
    let count = expect_number(&args[2], "substr")?.trunc();
    let length = text.chars().count();
    if begin < 0.0 || count < 0.0 || begin + count > length as f64 {
        return Err(
            Diagnostic::runtime(RuntimeErrorKind::Range, "invalid substring range").into(),
        );
    }
    let slice: String = text
        .chars()
        .skip(begin as usize)
        .take(count as usize)
        .collect();
    Ok(Value::string(slice))
}

/// `length` of anything without a length is nil, not an error.
fn collections_length(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let value = &args[0];
    if let Some(text) = value.as_str() {
        return Ok(Value::number(text.chars().count() as f64));
    }
    if let Some(values) = value.as_array() {
        return Ok(Value::number(values.borrow().len() as f64));
    }
    if let Some(entries) = value.as_table() {
        return Ok(Value::number(entries.borrow().len() as f64));
    }
    Ok(Value::Nil)
}

/// `find(haystack, needle)` yields the index of the first match, or nil.
/// For strings the index is character-addressed; for arrays an array needle
/// matches as a subsequence and anything else matches element-wise.
fn collections_find(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    if let Some(haystack) = args[0].as_str() {
        let needle = expect_str(&args[1], "find")?;
        return Ok(match haystack.find(needle) {
            Some(offset) => Value::number(haystack[..offset].chars().count() as f64),
            None => Value::Nil,
        });
    }
    if let Some(values) = args[0].as_array() {
        let values = values.borrow();
        if let Some(needle) = args[1].as_array() {
            let needle = needle.borrow();
            if needle.is_empty() {
                return Ok(Value::number(0.0));
            }
            if needle.len() <= values.len() {
                for start in 0..=values.len() - needle.len() {
                    let window = &values[start..start + needle.len()];
                    if window.iter().zip(needle.iter()).all(|(a, b)| a.equal(b)) {
                        return Ok(Value::number(start as f64));
                    }
                }
            }
            return Ok(Value::Nil);
        }
        for (idx, value) in values.iter().enumerate() {
            if value.equal(&args[1]) {
                return Ok(Value::number(idx as f64));
            }
        }
        return Ok(Value::Nil);
    }
    Err(type_error(format!(
        "`find` expected a string or array, got {}",
        args[0].type_name()
    ))
    .into())
}

fn collections_map(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let function = &args[0];
    let values = expect_array(&args[1], "map")?.borrow().clone();
    let mut mapped = Vec::with_capacity(values.len());
    for value in values {
        mapped.push(interpreter.call_value(function, &[value], None)?);
    }
    Ok(Value::array(mapped))
}

fn collections_filter(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let function = &args[0];
    let values = expect_array(&args[1], "filter")?.borrow().clone();
    let mut kept = Vec::new();
    for value in values {
        if interpreter
            .call_value(function, &[value.clone()], None)?
            .is_truthy()
        {
            kept.push(value);
        }
    }
    Ok(Value::array(kept))
}

/// Left fold seeded with the first element. An empty array reduces to nil.
fn collections_reduce(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let function = &args[0];
    let values = expect_array(&args[1], "reduce")?.borrow().clone();
    let mut iter = values.into_iter();
    let mut accumulator = match iter.next() {
        Some(first) => first,
        None => return Ok(Value::Nil),
    };
    for value in iter {
        accumulator = interpreter.call_value(function, &[accumulator, value], None)?;
    }
    Ok(accumulator)
}

/// `range(begin, end)` builds the half-open array `[begin, end)`, counting
/// by one. An end before begin clamps to begin, giving an empty array.
fn collections_range(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let begin = expect_number(&args[0], "range")?.trunc() as i64;
    let end = expect_number(&args[1], "range")?.trunc() as i64;
    let end = end.max(begin);
    let values = (begin..end).map(|n| Value::number(n as f64)).collect();
    Ok(Value::array(values))
}
