// 签名文本解析与成员判定
// 方法签名格式 (p1,p2,...)ret，按第一个 ')' 拆分，参数部分按 ',' 拆分
use crate::api::{
    FieldDescriptor, FieldSignature, MethodDescriptor, MethodSignature, TokenMatchFn,
};
use crate::errno::Errno;

pub(crate) fn parse_method_signature(text: &str) -> Result<MethodSignature, Errno> {
    let Some(close) = text.find(')') else {
        return Err(Errno::InvalidSignature);
    };
    let Some(params_text) = text[..close].strip_prefix('(') else {
        return Err(Errno::InvalidSignature);
    };
    // token 原样保留，不做 trim，"()" 表示无参数
    let params = if params_text.is_empty() {
        Vec::new()
    } else {
        params_text.split(',').map(str::to_string).collect()
    };
    Ok(MethodSignature {
        params,
        ret: text[close + 1..].to_string(),
    })
}

// 参数个数必须相等，返回类型与每个参数类型逐一做 token 判定
pub(crate) fn method_matches(
    method: &MethodDescriptor,
    sig: &MethodSignature,
    token_match: TokenMatchFn,
) -> bool {
    if method.param_types.len() != sig.params.len() {
        return false;
    }
    if !token_match(&method.return_type, &sig.ret) {
        return false;
    }
    method
        .param_types
        .iter()
        .zip(&sig.params)
        .all(|(param_type, token)| token_match(param_type, token))
}

pub(crate) fn field_matches(
    field: &FieldDescriptor,
    sig: &FieldSignature,
    token_match: TokenMatchFn,
) -> bool {
    token_match(&field.type_name, &sig.type_token)
}

#[cfg(test)]
mod tests {
    use super::{field_matches, method_matches, parse_method_signature};
    use crate::api::{
        FieldDescriptor, FieldSignature, MethodDescriptor, MethodSignature, contains_token,
    };
    use crate::errno::Errno;

    #[test]
    fn parses_params_and_return_token() {
        let sig = parse_method_signature("(a,b)c").unwrap();
        assert_eq!(sig.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sig.ret, "c");
    }

    #[test]
    fn empty_param_section_yields_no_tokens() {
        let sig = parse_method_signature("()r").unwrap();
        assert!(sig.params.is_empty());
        assert_eq!(sig.ret, "r");
    }

    #[test]
    fn missing_close_paren_is_invalid() {
        assert_eq!(parse_method_signature("(a,b"), Err(Errno::InvalidSignature));
        assert_eq!(parse_method_signature(""), Err(Errno::InvalidSignature));
    }

    #[test]
    fn missing_open_paren_is_invalid() {
        assert_eq!(parse_method_signature("a,b)c"), Err(Errno::InvalidSignature));
    }

    #[test]
    fn tokens_are_kept_verbatim() {
        let sig = parse_method_signature("(a,,b )").unwrap();
        assert_eq!(sig.params, vec!["a".to_string(), String::new(), "b ".to_string()]);
        assert_eq!(sig.ret, "");
    }

    #[test]
    fn display_renders_text_form() {
        for text in ["(a,b)c", "()r", "(java.lang.String)void"] {
            assert_eq!(parse_method_signature(text).unwrap().to_string(), text);
        }
        assert_eq!(text_of("(int)"), "(int)");
    }

    fn text_of(text: &str) -> String {
        text.parse::<MethodSignature>().unwrap().to_string()
    }

    #[test]
    fn method_match_uses_containment_per_position() {
        let method = MethodDescriptor::new(
            "a",
            &["android.os.Bundle", "java.lang.String"],
            "void",
        );
        let hit = parse_method_signature("(Bundle,String)void").unwrap();
        let swapped = parse_method_signature("(String,Bundle)void").unwrap();
        let wrong_ret = parse_method_signature("(Bundle,String)int").unwrap();
        assert!(method_matches(&method, &hit, contains_token));
        assert!(!method_matches(&method, &swapped, contains_token));
        assert!(!method_matches(&method, &wrong_ret, contains_token));
    }

    #[test]
    fn method_match_requires_equal_arity() {
        let method = MethodDescriptor::new("a", &["int", "int"], "void");
        let shorter = parse_method_signature("(int)void").unwrap();
        assert!(!method_matches(&method, &shorter, contains_token));
    }

    #[test]
    fn empty_tokens_match_any_type() {
        let method = MethodDescriptor::new("a", &["com.x.Y"], "boolean");
        let one_any = MethodSignature {
            params: vec![String::new()],
            ret: String::new(),
        };
        let no_params = parse_method_signature("()").unwrap();
        assert!(method_matches(&method, &one_any, contains_token));
        assert!(!method_matches(&method, &no_params, contains_token));
        assert!(field_matches(
            &FieldDescriptor::new("f", "int"),
            &FieldSignature::new(""),
            contains_token
        ));
    }

    #[test]
    fn custom_token_policy_replaces_containment() {
        fn exact(type_name: &str, token: &str) -> bool {
            type_name == token
        }
        let field = FieldDescriptor::new("f", "java.lang.String");
        assert!(field_matches(&field, &FieldSignature::new("String"), contains_token));
        assert!(!field_matches(&field, &FieldSignature::new("String"), exact));
        assert!(field_matches(&field, &FieldSignature::new("java.lang.String"), exact));
    }
}
