use once_cell::sync::Lazy;
use regex::Regex;

/// 邮箱格式校验: 本地部分@域名.后缀，不允许空白字符
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("邮箱正则表达式无效")
});

/// 校验邮箱格式
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// 必填字段校验 - 去除首尾空白后非空
pub fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// 字段校验规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// 必填
    Required,
    /// 必填且为合法邮箱
    Email,
}

/// 表单校验器 - 按登记顺序校验命名字段
///
/// 校验失败是局部的：返回无效字段名列表供页面标记，
/// 不抛出错误也不中断其他字段的校验。
pub struct FormValidator {
    fields: Vec<(String, FieldRule)>,
}

impl FormValidator {
    pub fn new() -> Self {
        FormValidator { fields: Vec::new() }
    }

    /// 登记一个必填字段
    pub fn require(&mut self, name: &str) -> &mut Self {
        self.fields.push((name.to_string(), FieldRule::Required));
        self
    }

    /// 登记一个邮箱字段
    pub fn email(&mut self, name: &str) -> &mut Self {
        self.fields.push((name.to_string(), FieldRule::Email));
        self
    }

    /// 校验全部字段，返回无效字段名；空列表表示允许提交
    pub fn validate(&self, values: &dyn Fn(&str) -> Option<String>) -> Vec<String> {
        let mut invalid = Vec::new();
        for (name, rule) in &self.fields {
            let value = values(name).unwrap_or_default();
            let ok = match rule {
                FieldRule::Required => is_filled(&value),
                FieldRule::Email => is_valid_email(&value),
            };
            if !ok {
                invalid.push(name.clone());
            }
        }
        invalid
    }
}

impl Default for FormValidator {
    fn default() -> Self {
        FormValidator::new()
    }
}
