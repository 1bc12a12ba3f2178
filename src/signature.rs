//! Conversions between Java source type syntax and JVM descriptors.
//!
//! `int[]` becomes `[I`, `java.lang.String` becomes `Ljava/lang/String;` and a source
//! signature such as `void put(java.lang.String key, int value)` becomes
//! `(Ljava/lang/String;I)V`. Descriptors are translated between namespaces with
//! [`rewrite_descriptor_classes`] once the full class rename table is known.

use std::collections::HashMap;

use crate::error::FormatError;

/// Converts a source-level type (`int`, `java.util.List`, `byte[][]`) to its descriptor.
pub fn class_name_to_descriptor(source_type: &str) -> String {
    let source_type = source_type.trim();

    if let Some(element) = source_type.strip_suffix("[]") {
        return format!("[{}", class_name_to_descriptor(element));
    }

    match primitive_code(source_type) {
        Some(code) => code.to_string(),
        None => format!("L{};", source_type.replace('.', "/")),
    }
}

fn primitive_code(keyword: &str) -> Option<char> {
    Some(match keyword {
        "void" => 'V',
        "boolean" => 'Z',
        "byte" => 'B',
        "char" => 'C',
        "short" => 'S',
        "int" => 'I',
        "long" => 'J',
        "float" => 'F',
        "double" => 'D',
        _ => return None,
    })
}

/// Converts `ReturnType name(Type a, Type b)` to `(AB)R`.
///
/// Only the leading type token of each parameter is used, so parameter names are optional.
/// With `keep_name` the method name is returned alongside the descriptor.
pub fn method_to_descriptor(
    signature: &str,
    keep_name: bool,
) -> Result<(String, Option<String>), FormatError> {
    let signature = signature.trim();
    let (Some(open), Some(close)) = (signature.find('('), signature.find(')')) else {
        return Err(FormatError::Parentheses(signature.to_string()));
    };
    if open > close {
        return Err(FormatError::Parentheses(signature.to_string()));
    }

    let mut head = signature[..open].split_whitespace();
    let return_type = head
        .next()
        .ok_or_else(|| FormatError::MissingReturnType(signature.to_string()))?;

    let mut descriptor = String::from("(");
    for param in signature[open + 1..close].split(',') {
        if let Some(param_type) = param.split_whitespace().next() {
            descriptor.push_str(&class_name_to_descriptor(param_type));
        }
    }
    descriptor.push(')');
    descriptor.push_str(&class_name_to_descriptor(return_type));

    if !keep_name {
        return Ok((descriptor, None));
    }
    let name = head
        .next()
        .ok_or_else(|| FormatError::MissingName(signature.to_string()))?;
    Ok((descriptor, Some(name.to_string())))
}

/// Rewrites every `L...;` class reference found in `rename` and copies everything else.
///
/// Works on field descriptors (`[La;`) as well as method descriptors (`(La;I)Lb;`).
/// An unterminated class reference is copied through unchanged.
pub fn rewrite_descriptor_classes(descriptor: &str, rename: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;

    while let Some(c) = rest.chars().next() {
        if c != 'L' {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        match rest.find(';') {
            Some(end) => {
                let class_descriptor = &rest[..=end];
                match rename.get(class_descriptor) {
                    Some(renamed) => out.push_str(renamed),
                    None => out.push_str(class_descriptor),
                }
                rest = &rest[end + 1..];
            }
            None => {
                out.push_str(rest);
                rest = "";
            }
        }
    }

    out
}

/// Last segment of a dotted or slashed qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified
        .rsplit(['.', '/'])
        .next()
        .unwrap_or(qualified)
}

/// `com.example.Foo` or `com/example/Foo` to the internal form `com/example/Foo`.
pub fn internal_name(qualified: &str) -> String {
    qualified.trim().replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_to_descriptor_handles_primitives_arrays_and_objects() {
        assert_eq!(class_name_to_descriptor("int"), "I");
        assert_eq!(class_name_to_descriptor("void"), "V");
        assert_eq!(class_name_to_descriptor("boolean[]"), "[Z");
        assert_eq!(class_name_to_descriptor(" long[][] "), "[[J");
        assert_eq!(
            class_name_to_descriptor("java.lang.String[]"),
            "[Ljava/lang/String;"
        );
        assert_eq!(class_name_to_descriptor("a"), "La;");
    }

    #[test]
    fn method_to_descriptor_converts_return_and_params() {
        let (descriptor, name) =
            method_to_descriptor("void put(java.lang.String key, int[] values)", true).unwrap();
        assert_eq!(descriptor, "(Ljava/lang/String;[I)V");
        assert_eq!(name.as_deref(), Some("put"));

        let (descriptor, name) = method_to_descriptor("com.example.Foo bar()", false).unwrap();
        assert_eq!(descriptor, "()Lcom/example/Foo;");
        assert!(name.is_none());
    }

    #[test]
    fn method_to_descriptor_tolerates_params_without_names() {
        let (descriptor, _) = method_to_descriptor("int bar(int,double , char)", false).unwrap();
        assert_eq!(descriptor, "(IDC)I");
    }

    #[test]
    fn method_to_descriptor_rejects_bad_parentheses() {
        assert!(matches!(
            method_to_descriptor("void bar", false),
            Err(FormatError::Parentheses(_))
        ));
        assert!(matches!(
            method_to_descriptor("void bar)int(", false),
            Err(FormatError::Parentheses(_))
        ));
        assert!(matches!(
            method_to_descriptor("void (int)", true),
            Err(FormatError::MissingName(_))
        ));
    }

    #[test]
    fn rewrite_descriptor_classes_substitutes_known_classes_only() {
        let rename: HashMap<String, String> = [
            ("Lcom/example/Foo;".to_string(), "La;".to_string()),
            ("Lcom/example/Bar;".to_string(), "Lb;".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            rewrite_descriptor_classes("(Lcom/example/Foo;[[Lcom/example/Bar;I)Ljava/lang/String;", &rename),
            "(La;[[Lb;I)Ljava/lang/String;"
        );
        assert_eq!(rewrite_descriptor_classes("[Lcom/example/Foo;", &rename), "[La;");
        assert_eq!(rewrite_descriptor_classes("J", &rename), "J");
        assert_eq!(rewrite_descriptor_classes("(Lbroken", &rename), "(Lbroken");
    }

    #[test]
    fn simple_name_takes_last_segment() {
        assert_eq!(simple_name("com.example.Foo"), "Foo");
        assert_eq!(simple_name("net/minecraft/Foo$Bar"), "Foo$Bar");
        assert_eq!(simple_name("a"), "a");
    }
}
