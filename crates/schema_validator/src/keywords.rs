//! Keyword parsing for a single schema object.

use crate::compiler::{Compiler, GraphBuilder, NodeAddress};
use crate::content::{ContentEncoding, MediaType};
use crate::schema::{Additional, Dependency, DynamicRef, Enum, Items, Schema, SchemaId};
use crate::vocab::CompilerContext;
use crate::{CompileError, Draft, Result};
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_traits::Zero;
use regex::Regex;
use schema_core::{Map, TypeSet, Value, escape};
use url::Url;

/// Populates one node from its raw object.
pub(crate) struct NodeBuilder<'a> {
    pub compiler: &'a mut Compiler,
    pub build: &'a mut GraphBuilder,
    pub addr: &'a NodeAddress,
    pub base: &'a Url,
    pub draft: Draft,
    pub location: &'a str,
    pub obj: &'a Map,
}

impl<'a> NodeBuilder<'a> {
    pub fn populate(&mut self, s: &mut Schema) -> Result<()> {
        if let Some(reference) = self.string("$ref")? {
            s.reference = Some(self.reference("$ref", reference)?);
            if self.draft.ref_overrides_siblings() {
                return Ok(());
            }
        }

        self.identifiers(s)?;
        self.validations(s)?;
        self.applicators(s)?;
        self.annotations(s)?;
        self.extensions(s)
    }

    fn identifiers(&mut self, s: &mut Schema) -> Result<()> {
        s.id = self.string(self.draft.id_keyword())?.map(str::to_string);
        if self.supports("$anchor") {
            s.anchor = self.string("$anchor")?.map(str::to_string);
        }
        if self.supports("$recursiveRef") {
            if let Some(reference) = self.string("$recursiveRef")? {
                s.recursive_ref = Some(self.reference("$recursiveRef", reference)?);
            }
            s.recursive_anchor = self.boolean("$recursiveAnchor")?.unwrap_or(false);
        }
        if self.supports("$dynamicRef") {
            s.dynamic_anchor = self.string("$dynamicAnchor")?.map(str::to_string);
            if let Some(reference) = self.string("$dynamicRef")? {
                s.dynamic_ref = Some(self.dynamic_reference(reference)?);
            }
        }
        Ok(())
    }

    fn validations(&mut self, s: &mut Schema) -> Result<()> {
        if let Some(value) = self.obj.get("type") {
            s.types = Some(self.types(value)?);
        }
        if let Some(value) = self.obj.get("enum") {
            let values = value
                .as_array()
                .ok_or_else(|| self.invalid("enum", "must be an array"))?;
            s.enumeration = Some(Enum::new(values.clone()));
        }
        if self.supports("const") {
            s.constant = self.obj.get("const").cloned();
        }

        // objects
        s.min_properties = self.count("minProperties")?;
        s.max_properties = self.count("maxProperties")?;
        s.required = self.string_list("required")?.unwrap_or_default();
        if self.supports("dependentRequired") {
            if let Some(value) = self.obj.get("dependentRequired") {
                let members = value
                    .as_object()
                    .ok_or_else(|| self.invalid("dependentRequired", "must be an object"))?;
                for (name, required) in members {
                    let names = self.names_of("dependentRequired", required)?;
                    s.dependent_required.insert(name.clone(), names);
                }
            }
        }

        // arrays
        s.min_items = self.count("minItems")?;
        s.max_items = self.count("maxItems")?;
        s.unique_items = self.boolean("uniqueItems")?.unwrap_or(false);
        if self.supports("minContains") {
            s.min_contains = self.count("minContains")?;
            s.max_contains = self.count("maxContains")?;
        }

        // strings
        s.min_length = self.count("minLength")?;
        s.max_length = self.count("maxLength")?;
        if let Some(pattern) = self.string("pattern")? {
            s.pattern = Some(self.regex("pattern", pattern)?);
        }
        if self.supports("contentEncoding") {
            s.content_encoding = self
                .string("contentEncoding")?
                .and_then(ContentEncoding::from_name);
            s.content_media_type = self
                .string("contentMediaType")?
                .and_then(MediaType::from_name);
        }

        // numbers
        s.minimum = self.number("minimum")?;
        s.maximum = self.number("maximum")?;
        if self.draft == Draft::V4 {
            if self.boolean("exclusiveMinimum")?.unwrap_or(false) {
                s.exclusive_minimum = s.minimum.take();
            }
            if self.boolean("exclusiveMaximum")?.unwrap_or(false) {
                s.exclusive_maximum = s.maximum.take();
            }
        } else {
            s.exclusive_minimum = self.number("exclusiveMinimum")?;
            s.exclusive_maximum = self.number("exclusiveMaximum")?;
        }
        if let Some(divisor) = self.number("multipleOf")? {
            if divisor <= BigDecimal::zero() {
                return Err(self.invalid("multipleOf", "must be greater than 0"));
            }
            s.multiple_of = Some(divisor);
        }
        Ok(())
    }

    fn applicators(&mut self, s: &mut Schema) -> Result<()> {
        s.not = self.single("not");
        s.all_of = self.list("allOf")?;
        s.any_of = self.list("anyOf")?;
        s.one_of = self.list("oneOf")?;
        if self.supports("if") {
            s.if_schema = self.single("if");
            s.then_schema = self.single("then");
            s.else_schema = self.single("else");
        }

        // objects
        s.properties = self.map("properties")?;
        for (pattern, sid) in self.map("patternProperties")? {
            let regex = self.regex("patternProperties", &pattern)?;
            s.pattern_properties.push((regex, sid));
        }
        s.additional_properties = self.additional("additionalProperties");
        s.property_names = self.single("propertyNames");
        if self.supports("dependencies") {
            if let Some(value) = self.obj.get("dependencies") {
                let members = value
                    .as_object()
                    .ok_or_else(|| self.invalid("dependencies", "must be an object"))?;
                for (name, dependency) in members {
                    let dependency = match dependency {
                        Value::Array(_) => {
                            Dependency::Required(self.names_of("dependencies", dependency)?)
                        }
                        _ => Dependency::Schema(
                            self.child(&format!("dependencies/{}", escape(name))),
                        ),
                    };
                    s.dependencies.insert(name.clone(), dependency);
                }
            }
        }
        s.dependent_schemas = self.map("dependentSchemas")?;
        s.unevaluated_properties = self.single("unevaluatedProperties");

        // arrays
        if self.draft <= Draft::V2019_09 {
            s.items = match self.obj.get("items") {
                None => None,
                Some(Value::Array(_)) => Some(Items::Tuple(self.list("items")?)),
                Some(_) => self.single("items").map(Items::Schema),
            };
            s.additional_items = self.additional("additionalItems");
        } else {
            s.prefix_items = self.list("prefixItems")?;
            s.rest_items = self.single("items");
        }
        s.contains = self.single("contains");
        s.unevaluated_items = self.single("unevaluatedItems");

        // strings
        s.content_schema = self.single("contentSchema");
        Ok(())
    }

    fn annotations(&mut self, s: &mut Schema) -> Result<()> {
        s.title = self.string("title")?.map(str::to_string);
        s.description = self.string("description")?.map(str::to_string);
        s.format = self.string("format")?.map(str::to_string);
        s.default = self.obj.get("default").cloned();
        if self.supports("$comment") {
            s.comment = self.string("$comment")?.map(str::to_string);
            s.read_only = self.boolean("readOnly")?.unwrap_or(false);
            s.write_only = self.boolean("writeOnly")?.unwrap_or(false);
        }
        if self.supports("examples") {
            if let Some(examples) = self.obj.get("examples") {
                s.examples = examples
                    .as_array()
                    .ok_or_else(|| self.invalid("examples", "must be an array"))?
                    .clone();
            }
        }
        if self.supports("deprecated") {
            s.deprecated = self.boolean("deprecated")?.unwrap_or(false);
        }
        // Not a standard keyword; other meanings of `order` are left alone.
        s.order = self.obj.get("order").and_then(Value::as_number).cloned();
        Ok(())
    }

    fn extensions(&mut self, s: &mut Schema) -> Result<()> {
        let vocabularies = self.compiler.enabled_vocabularies();
        if vocabularies.is_empty() {
            return Ok(());
        }
        let raw = Value::Object(self.obj.clone());
        let ctx = CompilerContext::new(self.location, self.draft);
        for vocabulary in vocabularies {
            if let Some(meta) = vocabulary.meta_schema() {
                meta.validate(&raw).map_err(|err| CompileError::MetaSchema {
                    location: self.location.to_string(),
                    vocabulary: vocabulary.url().to_string(),
                    source: Box::new(err),
                })?;
            }
            if let Some(extension) = vocabulary.compile(&ctx, self.obj)? {
                s.extensions.push(extension);
            }
        }
        Ok(())
    }

    // references

    fn reference(&mut self, keyword: &str, reference: &str) -> Result<SchemaId> {
        let addr = self.resolve(keyword, reference)?;
        Ok(self.build.enqueue(addr))
    }

    fn resolve(&mut self, keyword: &str, reference: &str) -> Result<NodeAddress> {
        let url = self
            .base
            .join(reference)
            .map_err(|e| self.invalid(keyword, e.to_string()))?;
        let keyword_location = format!("{}/{}", self.location, escape(keyword));
        self.compiler
            .locate(&url)?
            .ok_or_else(|| CompileError::unresolved(keyword_location, url.as_str()))
    }

    /// `$dynamicRef` behaves dynamically only when its static target
    /// declares the same name as `$dynamicAnchor`.
    fn dynamic_reference(&mut self, reference: &str) -> Result<DynamicRef> {
        let addr = self.resolve("$dynamicRef", reference)?;
        let name = reference
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .filter(|fragment| !fragment.is_empty() && !fragment.starts_with('/'));
        let anchor = match name {
            Some(name) => {
                let target = self.compiler.raw_value(&addr)?;
                let declared = target
                    .as_ref()
                    .and_then(|value| value.get("$dynamicAnchor"))
                    .and_then(Value::as_str);
                (declared == Some(name)).then(|| name.to_string())
            }
            None => None,
        };
        Ok(DynamicRef {
            target: self.build.enqueue(addr),
            anchor,
        })
    }

    // subschemas

    fn child(&mut self, suffix: &str) -> SchemaId {
        self.build.enqueue(self.addr.child(suffix))
    }

    fn single(&mut self, keyword: &str) -> Option<SchemaId> {
        if !self.supports(keyword) || !self.obj.contains_key(keyword) {
            return None;
        }
        Some(self.child(&escape(keyword)))
    }

    fn list(&mut self, keyword: &str) -> Result<Vec<SchemaId>> {
        if !self.supports(keyword) {
            return Ok(Vec::new());
        }
        let len = match self.obj.get(keyword) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items.len(),
            Some(_) => return Err(self.invalid(keyword, "must be an array of schemas")),
        };
        Ok((0..len)
            .map(|i| self.child(&format!("{}/{i}", escape(keyword))))
            .collect())
    }

    fn map(&mut self, keyword: &str) -> Result<IndexMap<String, SchemaId>> {
        let mut out = IndexMap::new();
        if !self.supports(keyword) {
            return Ok(out);
        }
        let names: Vec<String> = match self.obj.get(keyword) {
            None => return Ok(out),
            Some(Value::Object(members)) => members.keys().cloned().collect(),
            Some(_) => return Err(self.invalid(keyword, "must be an object of schemas")),
        };
        for name in names {
            let sid = self.child(&format!("{}/{}", escape(keyword), escape(&name)));
            out.insert(name, sid);
        }
        Ok(out)
    }

    fn additional(&mut self, keyword: &str) -> Option<Additional> {
        if !self.supports(keyword) {
            return None;
        }
        match self.obj.get(keyword)? {
            Value::Bool(allowed) => Some(Additional::Bool(*allowed)),
            _ => self.single(keyword).map(Additional::Schema),
        }
    }

    // scalar keyword values

    fn supports(&self, keyword: &str) -> bool {
        self.draft.supports(keyword)
    }

    fn invalid(&self, keyword: &str, reason: impl Into<String>) -> CompileError {
        CompileError::invalid_keyword(self.location, keyword, reason)
    }

    fn string(&self, keyword: &str) -> Result<Option<&'a str>> {
        match self.obj.get(keyword) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(keyword, "must be a string")),
        }
    }

    fn boolean(&self, keyword: &str) -> Result<Option<bool>> {
        match self.obj.get(keyword) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(keyword, "must be a boolean")),
        }
    }

    fn number(&self, keyword: &str) -> Result<Option<BigDecimal>> {
        match self.obj.get(keyword) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n.clone())),
            Some(_) => Err(self.invalid(keyword, "must be a number")),
        }
    }

    fn count(&self, keyword: &str) -> Result<Option<usize>> {
        match self.obj.get(keyword) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(keyword, "must be a non-negative integer")),
        }
    }

    fn string_list(&self, keyword: &str) -> Result<Option<Vec<String>>> {
        self.obj
            .get(keyword)
            .map(|value| self.names_of(keyword, value))
            .transpose()
    }

    fn names_of(&self, keyword: &str, value: &Value) -> Result<Vec<String>> {
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(keyword, "must be an array of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(keyword, "must be an array of strings"))
            })
            .collect()
    }

    fn types(&self, value: &Value) -> Result<TypeSet> {
        let names: Vec<&str> = match value {
            Value::String(name) => vec![name.as_str()],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        self.invalid("type", "must be a string or an array of strings")
                    })
                })
                .collect::<Result<_>>()?,
            _ => return Err(self.invalid("type", "must be a string or an array of strings")),
        };
        TypeSet::from_names(names).map_err(|e| self.invalid("type", e.to_string()))
    }

    fn regex(&self, keyword: &str, pattern: &str) -> Result<Regex> {
        Regex::new(pattern).map_err(|e| self.invalid(keyword, e.to_string()))
    }
}
