//! Introspection model: what a class source knows about one class.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    /// Qualified name, e.g. `com.example.Widget`.
    pub name: String,
    pub simple_name: String,
    pub kind: ClassKind,
    /// Declared supertypes. For a `class` the first entry is the superclass.
    pub supertypes: Vec<TypeRef>,
    pub annotations: Vec<Annotation>,
    pub members: Vec<MemberInfo>,
    pub methods: Vec<MethodInfo>,
    pub constructors: Vec<ConstructorInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum(Vec<String>),
}

/// A property as seen by serialization: a field and its accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub ty: TypeRef,
    /// Annotations on the backing field.
    pub annotations: Vec<Annotation>,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub public: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accessor {
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub params: Vec<ParamInfo>,
    /// `None` for methods without a declared return type (`void`).
    pub return_type: Option<TypeRef>,
    /// Recorded body of a routine, if the source provides one.
    pub body: Option<Vec<CallChain>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: TypeRef,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorInfo {
    pub params: Vec<ParamInfo>,
}

/// A generic type shape: `List<String>`, `byte[]`, `com.example.Widget`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub values: BTreeMap<String, AnnotationValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Str(String),
    Int(i64),
    Ident(String),
    List(Vec<AnnotationValue>),
}

/// One fluent statement of a routine body: `http.csrf().disable()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallChain {
    pub receiver: String,
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<CallArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Str(String),
    Int(i64),
    Ident(String),
}

impl std::fmt::Display for CallArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallArg::Str(s) => write!(f, "\"{}\"", s),
            CallArg::Int(n) => write!(f, "{}", n),
            CallArg::Ident(s) => write!(f, "{}", s),
        }
    }
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array: false,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            array: false,
        }
    }

    /// Last segment of the type name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// The same type without its array suffix.
    pub fn element(&self) -> TypeRef {
        Self {
            name: self.name.clone(),
            args: self.args.clone(),
            array: false,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        if self.array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: AnnotationValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.get(key)
    }

    /// First string of `key`, accepting a single value or a list.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            AnnotationValue::Str(s) => Some(s),
            AnnotationValue::List(items) => items.iter().find_map(|v| match v {
                AnnotationValue::Str(s) => Some(s.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Boolean attribute; `None` when absent or not a boolean literal.
    pub fn bool_value(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            AnnotationValue::Ident(s) if s == "true" => Some(true),
            AnnotationValue::Ident(s) if s == "false" => Some(false),
            _ => None,
        }
    }

    /// First identifier of `key`, e.g. a class literal or enum constant.
    pub fn ident_value(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            AnnotationValue::Ident(s) => Some(s),
            AnnotationValue::List(items) => items.iter().find_map(|v| match v {
                AnnotationValue::Ident(s) => Some(s.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// `value`, falling back to `path`: the two spellings of a mapping path.
    pub fn path(&self) -> Option<&str> {
        self.str_value("value").or_else(|| self.str_value("path"))
    }
}

impl ClassInfo {
    pub fn annotation(&self, marker: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, marker)
    }

    pub fn has(&self, marker: &str) -> bool {
        self.annotation(marker).is_some()
    }

    pub fn superclass(&self) -> Option<&TypeRef> {
        match self.kind {
            ClassKind::Class => self.supertypes.first(),
            _ => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, ClassKind::Enum(_))
    }

    pub fn has_default_constructor(&self) -> bool {
        self.constructors.is_empty() || self.constructors.iter().any(|c| c.params.is_empty())
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl MemberInfo {
    /// Annotations visible on the field and its read accessor.
    pub fn read_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .chain(self.getter.iter().flat_map(|g| g.annotations.iter()))
    }

    pub fn has(&self, marker: &str) -> bool {
        self.read_annotations().any(|a| a.simple_name() == marker)
    }

    pub fn annotation(&self, marker: &str) -> Option<&Annotation> {
        self.read_annotations().find(|a| a.simple_name() == marker)
    }

    pub fn is_accessible(&self) -> bool {
        self.getter.is_some() || self.public
    }
}

impl MethodInfo {
    pub fn annotation(&self, marker: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, marker)
    }

    pub fn has(&self, marker: &str) -> bool {
        self.annotation(marker).is_some()
    }
}

impl ParamInfo {
    pub fn annotation(&self, marker: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, marker)
    }

    pub fn has(&self, marker: &str) -> bool {
        self.annotation(marker).is_some()
    }
}

pub fn find_annotation<'a>(annotations: &'a [Annotation], marker: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.simple_name() == marker)
}

pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
