use serde_json::{Map, Value, json};

/// JSON schema primitive types used in function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Array,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Array => "array",
        }
    }
}

/// One required function parameter.
#[derive(Debug, Clone)]
pub struct FunctionParam {
    /// Key in the JSON arguments object.
    pub name: String,
    /// Shown to the model next to the parameter.
    pub description: Option<String>,
    pub kind: ParamType,
    /// Element type when `kind` is [`ParamType::Array`].
    pub items: Option<ParamType>,
}

impl FunctionParam {
    fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            items: None,
        }
    }

    pub fn array_of(name: impl Into<String>, items: ParamType) -> Self {
        Self {
            items: Some(items),
            ..Self::new(name, ParamType::Array)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Function the model is asked to call.
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub params: Vec<FunctionParam>,
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: FunctionParam) -> Self {
        self.params.push(param);
        self
    }

    fn to_schema(&self) -> Value {
        let mut properties = Map::new();

        for param in &self.params {
            let mut param_def = Map::new();
            param_def.insert("type".to_string(), Value::from(param.kind.as_str()));
            if let Some(items) = param.items {
                param_def.insert("items".to_string(), json!({ "type": items.as_str() }));
            }
            if let Some(description) = &param.description {
                param_def.insert("description".to_string(), Value::from(description.as_str()));
            }
            properties.insert(param.name.clone(), Value::Object(param_def));
        }
        let required: Vec<Value> = self
            .params
            .iter()
            .map(|param| Value::from(param.name.as_str()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Serializes the declaration as a chat-completions `tools` entry.
    pub fn to_tool_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.to_schema(),
            }
        })
    }

    /// `tool_choice` value that forces the model to call this function.
    pub fn forced_choice(&self) -> Value {
        json!({
            "type": "function",
            "function": { "name": self.name },
        })
    }
}
