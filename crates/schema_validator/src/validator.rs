//! Validation engine.
//!
//! Walks the compiled graph alongside an instance. Every schema application
//! pushes a frame on the dynamic scope; the frames drive `$dynamicRef` and
//! `$recursiveRef` resolution, the depth limit and loop detection.
//!
//! Each successful application returns the members and elements it left
//! unevaluated, so that `unevaluatedProperties` and `unevaluatedItems` see
//! what adjacent and nested keywords already covered.

use crate::schema::{Additional, Dependency, Items, Schema, SchemaGraph, SchemaId};
use crate::vocab::ValidatorContext;
use crate::{Draft, ErrorKind, ExtensionTypePolicy, ValidationError};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use schema_core::{InstanceLocation, Map, TypeTag, Value};
use std::collections::{BTreeSet, HashSet};

/// Members and elements not yet evaluated at one instance location.
#[derive(Debug, Clone, Default)]
pub(crate) struct Uneval {
    pub props: HashSet<String>,
    pub items: BTreeSet<usize>,
}

impl Uneval {
    fn of(instance: &Value) -> Self {
        match instance {
            Value::Object(obj) => Self {
                props: obj.keys().cloned().collect(),
                items: BTreeSet::new(),
            },
            Value::Array(arr) => Self {
                props: HashSet::new(),
                items: (0..arr.len()).collect(),
            },
            _ => Self::default(),
        }
    }

    /// Keeps only what the successful sibling evaluation also left open.
    fn merge(&mut self, other: &Uneval) {
        self.props.retain(|p| other.props.contains(p));
        self.items.retain(|i| other.items.contains(i));
    }
}

/// State of one node application.
#[derive(Debug, Default)]
pub(crate) struct Evaluation {
    pub uneval: Uneval,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    schema: SchemaId,
    /// Value the node is applied to; only compared by address
    instance: *const Value,
}

type Outcome = Result<Uneval, ValidationError>;

pub(crate) struct Validator<'g> {
    graph: &'g SchemaGraph,
    scope: Vec<Frame>,
}

impl<'g> Validator<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self {
            graph,
            scope: Vec::new(),
        }
    }

    /// Applies the node `id` to `instance`.
    pub fn validate(
        &mut self,
        id: SchemaId,
        instance: &Value,
        vloc: &InstanceLocation,
    ) -> Outcome {
        let schema = self.graph.get(id);

        if self.scope.len() >= self.graph.options.max_depth {
            let kind = ErrorKind::RecursionLimit {
                depth: self.scope.len(),
            };
            return Err(ValidationError::new(&schema.location, vloc, kind));
        }
        if self
            .scope
            .iter()
            .any(|frame| frame.schema == id && std::ptr::eq(frame.instance, instance))
        {
            let kind = ErrorKind::InfiniteLoop {
                location: schema.location.clone(),
            };
            return Err(ValidationError::new(&schema.location, vloc, kind));
        }

        self.scope.push(Frame {
            schema: id,
            instance,
        });
        let outcome = self.apply(schema, instance, vloc);
        self.scope.pop();
        outcome
    }

    fn apply(&mut self, schema: &'g Schema, v: &Value, vloc: &InstanceLocation) -> Outcome {
        if let Some(allowed) = schema.boolean {
            return if allowed {
                Ok(Uneval::of(v))
            } else {
                Err(ValidationError::new(&schema.location, vloc, ErrorKind::FalseSchema))
            };
        }

        let mut eval = Evaluation {
            uneval: Uneval::of(v),
            errors: Vec::new(),
        };

        self.check_type(schema, v, vloc, &mut eval);
        self.check_const_enum(schema, v, vloc, &mut eval);

        match v {
            Value::Object(obj) => self.check_object(schema, obj, v, vloc, &mut eval),
            Value::Array(arr) => self.check_array(schema, arr, vloc, &mut eval),
            Value::String(s) => self.check_string(schema, s, vloc, &mut eval),
            Value::Number(n) => check_number(schema, n, vloc, &mut eval),
            _ => {}
        }

        self.check_references(schema, v, vloc, &mut eval);
        self.check_applicators(schema, v, vloc, &mut eval);

        if !schema.extensions.is_empty() {
            let mut ctx = ValidatorContext::new(&mut eval, &schema.location, vloc);
            for extension in &schema.extensions {
                extension.validate(&mut ctx, v);
            }
        }

        self.check_unevaluated(schema, v, vloc, &mut eval);

        let Evaluation { uneval, mut errors } = eval;
        match errors.len() {
            0 => Ok(uneval),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::new(&schema.location, vloc, ErrorKind::Group)
                .with_causes(errors)),
        }
    }

    fn check_type(
        &self,
        schema: &Schema,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        let Some(types) = schema.types else {
            return;
        };
        let matches = match v.type_tag() {
            Some(tag) if types.contains(tag) => true,
            Some(TypeTag::NUMBER) => types.contains(TypeTag::INTEGER) && v.is_integer(),
            Some(tag) if tag.is_extension() => {
                self.graph.options.extension_types == ExtensionTypePolicy::Implicit
            }
            _ => false,
        };
        if !matches {
            let kind = ErrorKind::Type {
                got: v.type_name(),
                want: types.names().into_iter().map(str::to_string).collect(),
            };
            eval.errors.push(ValidationError::new(&schema.location, vloc, kind));
        }
    }

    fn check_const_enum(
        &self,
        schema: &Schema,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        if let Some(want) = &schema.constant {
            match schema_core::equals(v, want) {
                Ok(true) => {}
                Ok(false) => eval.errors.push(ValidationError::new(
                    &schema.location,
                    vloc,
                    ErrorKind::Const {
                        got: v.clone(),
                        want: want.clone(),
                    },
                )),
                Err(err) => eval.errors.push(incomparable(schema, vloc, "const", err)),
            }
        }

        if let Some(enumeration) = &schema.enumeration {
            let mut found = false;
            if enumeration.may_contain(v) {
                for candidate in &enumeration.values {
                    match schema_core::equals(v, candidate) {
                        Ok(true) => {
                            found = true;
                            break;
                        }
                        Ok(false) => {}
                        Err(err) => {
                            eval.errors.push(incomparable(schema, vloc, "enum", err));
                            return;
                        }
                    }
                }
            }
            if !found {
                eval.errors.push(ValidationError::new(
                    &schema.location,
                    vloc,
                    ErrorKind::Enum {
                        got: v.clone(),
                        want: enumeration.values.clone(),
                    },
                ));
            }
        }
    }

    fn check_object(
        &mut self,
        schema: &'g Schema,
        obj: &Map,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        let loc = schema.location.as_str();

        if let Some(min) = schema.min_properties {
            if obj.len() < min {
                let kind = ErrorKind::MinProperties {
                    got: obj.len(),
                    want: min,
                };
                eval.errors.push(ValidationError::new(loc, vloc, kind));
            }
        }
        if let Some(max) = schema.max_properties {
            if obj.len() > max {
                let kind = ErrorKind::MaxProperties {
                    got: obj.len(),
                    want: max,
                };
                eval.errors.push(ValidationError::new(loc, vloc, kind));
            }
        }

        let missing = missing_properties(obj, &schema.required);
        if !missing.is_empty() {
            eval.errors
                .push(ValidationError::new(loc, vloc, ErrorKind::Required { missing }));
        }

        for (name, &sid) in &schema.properties {
            if let Some(pv) = obj.get(name) {
                eval.uneval.props.remove(name);
                if let Err(err) = self.validate(sid, pv, &vloc.property(name.as_str())) {
                    eval.errors.push(err);
                }
            }
        }

        for (name, pv) in obj {
            for (regex, sid) in &schema.pattern_properties {
                if regex.is_match(name) {
                    eval.uneval.props.remove(name);
                    if let Err(err) = self.validate(*sid, pv, &vloc.property(name.as_str())) {
                        eval.errors.push(err);
                    }
                }
            }
        }

        if let Some(additional) = schema.additional_properties {
            let extra: Vec<&String> = obj
                .keys()
                .filter(|name| {
                    !schema.properties.contains_key(*name)
                        && !schema
                            .pattern_properties
                            .iter()
                            .any(|(regex, _)| regex.is_match(name))
                })
                .collect();
            match additional {
                Additional::Bool(false) if !extra.is_empty() => {
                    let kind = ErrorKind::AdditionalProperties {
                        properties: extra.iter().map(|name| name.to_string()).collect(),
                    };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
                Additional::Schema(sid) => {
                    for name in &extra {
                        let pv = &obj[*name];
                        if let Err(err) = self.validate(sid, pv, &vloc.property(name.as_str())) {
                            eval.errors.push(err);
                        }
                    }
                }
                _ => {}
            }
            for name in extra {
                eval.uneval.props.remove(name);
            }
        }

        if let Some(sid) = schema.property_names {
            for name in obj.keys() {
                if let Err(err) = self.validate(sid, &Value::String(name.clone()), vloc) {
                    let kind = ErrorKind::PropertyNames {
                        property: name.clone(),
                    };
                    eval.errors
                        .push(ValidationError::new(loc, vloc, kind).with_causes(vec![err]));
                }
            }
        }

        for (name, dependency) in &schema.dependencies {
            if !obj.contains_key(name) {
                continue;
            }
            match dependency {
                Dependency::Required(required) => {
                    let missing = missing_properties(obj, required);
                    if !missing.is_empty() {
                        let kind = ErrorKind::Dependency {
                            property: name.clone(),
                            missing,
                        };
                        eval.errors.push(ValidationError::new(loc, vloc, kind));
                    }
                }
                Dependency::Schema(sid) => match self.validate(*sid, v, vloc) {
                    Ok(uneval) => eval.uneval.merge(&uneval),
                    Err(err) => eval.errors.push(err),
                },
            }
        }

        for (name, required) in &schema.dependent_required {
            if obj.contains_key(name) {
                let missing = missing_properties(obj, required);
                if !missing.is_empty() {
                    let kind = ErrorKind::DependentRequired {
                        property: name.clone(),
                        missing,
                    };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
            }
        }

        for (name, &sid) in &schema.dependent_schemas {
            if obj.contains_key(name) {
                match self.validate(sid, v, vloc) {
                    Ok(uneval) => eval.uneval.merge(&uneval),
                    Err(err) => eval.errors.push(err),
                }
            }
        }
    }

    fn check_array(
        &mut self,
        schema: &'g Schema,
        arr: &[Value],
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        let loc = schema.location.as_str();

        if let Some(min) = schema.min_items {
            if arr.len() < min {
                let kind = ErrorKind::MinItems {
                    got: arr.len(),
                    want: min,
                };
                eval.errors.push(ValidationError::new(loc, vloc, kind));
            }
        }
        if let Some(max) = schema.max_items {
            if arr.len() > max {
                let kind = ErrorKind::MaxItems {
                    got: arr.len(),
                    want: max,
                };
                eval.errors.push(ValidationError::new(loc, vloc, kind));
            }
        }

        if schema.unique_items {
            match schema_core::duplicates(arr) {
                Ok(None) => {}
                Ok(Some(duplicates)) => {
                    let kind = ErrorKind::UniqueItems { duplicates };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
                Err(err) => eval.errors.push(incomparable(schema, vloc, "uniqueItems", err)),
            }
        }

        // Positional schemas first, then the schema for the remaining elements.
        let (prefix, rest): (&[SchemaId], Option<Additional>) = match &schema.items {
            Some(Items::Schema(sid)) => (&[], Some(Additional::Schema(*sid))),
            Some(Items::Tuple(ids)) => (ids.as_slice(), schema.additional_items),
            None if schema.draft >= Draft::V2020_12 => (
                schema.prefix_items.as_slice(),
                schema.rest_items.map(Additional::Schema),
            ),
            None => (&[], None),
        };
        for (i, (item, &sid)) in arr.iter().zip(prefix).enumerate() {
            eval.uneval.items.remove(&i);
            if let Err(err) = self.validate(sid, item, &vloc.index(i)) {
                eval.errors.push(err);
            }
        }
        if arr.len() > prefix.len() {
            match rest {
                Some(Additional::Bool(false)) => {
                    let kind = ErrorKind::AdditionalItems {
                        count: arr.len() - prefix.len(),
                    };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
                Some(Additional::Schema(sid)) => {
                    for (i, item) in arr.iter().enumerate().skip(prefix.len()) {
                        if let Err(err) = self.validate(sid, item, &vloc.index(i)) {
                            eval.errors.push(err);
                        }
                    }
                }
                Some(Additional::Bool(true)) | None => {}
            }
            if rest.is_some() {
                eval.uneval.items.clear();
            }
        }

        if let Some(sid) = schema.contains {
            let mut matched = Vec::new();
            let mut failures = Vec::new();
            for (i, item) in arr.iter().enumerate() {
                match self.validate(sid, item, &vloc.index(i)) {
                    Ok(_) => {
                        matched.push(i);
                        if schema.draft >= Draft::V2020_12 {
                            eval.uneval.items.remove(&i);
                        }
                    }
                    Err(err) => failures.push(err),
                }
            }
            let min = schema.min_contains.unwrap_or(1);
            if matched.len() < min {
                let err = match schema.min_contains {
                    None => ValidationError::new(loc, vloc, ErrorKind::Contains)
                        .with_causes(failures),
                    Some(want) => ValidationError::new(
                        loc,
                        vloc,
                        ErrorKind::MinContains {
                            got: matched.clone(),
                            want,
                        },
                    ),
                };
                eval.errors.push(err);
            }
            if let Some(max) = schema.max_contains {
                if matched.len() > max {
                    let kind = ErrorKind::MaxContains {
                        got: matched,
                        want: max,
                    };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
            }
        }
    }

    fn check_string(
        &mut self,
        schema: &'g Schema,
        s: &str,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        let loc = schema.location.as_str();

        if schema.min_length.is_some() || schema.max_length.is_some() {
            let len = s.chars().count();
            if let Some(min) = schema.min_length {
                if len < min {
                    let kind = ErrorKind::MinLength { got: len, want: min };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
            }
            if let Some(max) = schema.max_length {
                if len > max {
                    let kind = ErrorKind::MaxLength { got: len, want: max };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
            }
        }

        if let Some(pattern) = &schema.pattern {
            if !pattern.is_match(s) {
                let kind = ErrorKind::Pattern {
                    got: s.to_string(),
                    want: pattern.as_str().to_string(),
                };
                eval.errors.push(ValidationError::new(loc, vloc, kind));
            }
        }

        let has_content = schema.content_encoding.is_some() || schema.content_media_type.is_some();
        if !has_content || !self.graph.options.asserts_content(schema.draft) {
            return;
        }
        let decoded = match schema.content_encoding {
            Some(encoding) => match encoding.decode(s) {
                Ok(bytes) => bytes,
                Err(reason) => {
                    let kind = ErrorKind::ContentEncoding {
                        want: encoding.name().to_string(),
                        reason,
                    };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                    return;
                }
            },
            None => s.as_bytes().to_vec(),
        };
        let Some(media_type) = schema.content_media_type else {
            return;
        };
        let content = match media_type.parse(&decoded) {
            Ok(content) => content,
            Err(reason) => {
                let kind = ErrorKind::ContentMediaType {
                    want: media_type.name().to_string(),
                    reason,
                };
                eval.errors.push(ValidationError::new(loc, vloc, kind));
                return;
            }
        };
        if let Some(sid) = schema.content_schema {
            if let Err(err) = self.validate(sid, &content, vloc) {
                eval.errors.push(
                    ValidationError::new(loc, vloc, ErrorKind::ContentSchema).with_causes(vec![err]),
                );
            }
        }
    }

    fn check_references(
        &mut self,
        schema: &'g Schema,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        if let Some(target) = schema.reference {
            self.apply_reference(schema, "$ref", target, v, vloc, eval);
        }
        if let Some(target) = schema.recursive_ref {
            let target = self.resolve_recursive(target);
            self.apply_reference(schema, "$recursiveRef", target, v, vloc, eval);
        }
        if let Some(dynamic) = &schema.dynamic_ref {
            let target = match &dynamic.anchor {
                Some(anchor) => self.resolve_dynamic(anchor).unwrap_or(dynamic.target),
                None => dynamic.target,
            };
            self.apply_reference(schema, "$dynamicRef", target, v, vloc, eval);
        }
    }

    fn apply_reference(
        &mut self,
        schema: &Schema,
        keyword: &str,
        target: SchemaId,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        match self.validate(target, v, vloc) {
            Ok(uneval) => eval.uneval.merge(&uneval),
            Err(err) => {
                let kind = ErrorKind::Reference {
                    keyword: keyword.to_string(),
                    url: self.graph.get(target).location.clone(),
                };
                eval.errors.push(
                    ValidationError::new(&schema.location, vloc, kind).with_causes(vec![err]),
                );
            }
        }
    }

    /// `$recursiveRef`: when the static target allows recursion, the
    /// outermost resource in scope that also allows it wins.
    fn resolve_recursive(&self, target: SchemaId) -> SchemaId {
        if !self.graph.get(target).recursive_anchor {
            return target;
        }
        self.scope
            .iter()
            .map(|frame| self.graph.get(frame.schema).resource)
            .find(|&resource| self.graph.get(resource).recursive_anchor)
            .unwrap_or(target)
    }

    /// `$dynamicRef`: the outermost resource in scope declaring the anchor wins.
    fn resolve_dynamic(&self, anchor: &str) -> Option<SchemaId> {
        self.scope.iter().find_map(|frame| {
            let resource = self.graph.get(frame.schema).resource;
            self.graph.get(resource).dynamic_anchors.get(anchor).copied()
        })
    }

    fn check_applicators(
        &mut self,
        schema: &'g Schema,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        let loc = schema.location.as_str();

        if let Some(sid) = schema.not {
            if self.validate(sid, v, vloc).is_ok() {
                eval.errors.push(ValidationError::new(loc, vloc, ErrorKind::Not));
            }
        }

        if !schema.all_of.is_empty() {
            let mut failures = Vec::new();
            for &sid in &schema.all_of {
                match self.validate(sid, v, vloc) {
                    Ok(uneval) => eval.uneval.merge(&uneval),
                    Err(err) => failures.push(err),
                }
            }
            if !failures.is_empty() {
                eval.errors
                    .push(ValidationError::new(loc, vloc, ErrorKind::AllOf).with_causes(failures));
            }
        }

        if !schema.any_of.is_empty() {
            // Later drafts need every passing branch for unevaluated* annotations.
            let exhaustive = schema.draft >= Draft::V2019_09;
            let mut matched = false;
            let mut failures = Vec::new();
            for &sid in &schema.any_of {
                match self.validate(sid, v, vloc) {
                    Ok(uneval) => {
                        eval.uneval.merge(&uneval);
                        matched = true;
                        if !exhaustive {
                            break;
                        }
                    }
                    Err(err) => failures.push(err),
                }
            }
            if !matched {
                eval.errors
                    .push(ValidationError::new(loc, vloc, ErrorKind::AnyOf).with_causes(failures));
            }
        }

        if !schema.one_of.is_empty() {
            let mut matched: Option<(usize, Uneval)> = None;
            let mut failures = Vec::new();
            let mut ambiguous = None;
            for (i, &sid) in schema.one_of.iter().enumerate() {
                match self.validate(sid, v, vloc) {
                    Ok(uneval) => match &matched {
                        Some((first, _)) => {
                            ambiguous = Some((*first, i));
                            break;
                        }
                        None => matched = Some((i, uneval)),
                    },
                    Err(err) => failures.push(err),
                }
            }
            match (ambiguous, matched) {
                (Some(pair), _) => {
                    let kind = ErrorKind::OneOf {
                        matched: Some(pair),
                    };
                    eval.errors.push(ValidationError::new(loc, vloc, kind));
                }
                (None, Some((_, uneval))) => eval.uneval.merge(&uneval),
                (None, None) => {
                    let kind = ErrorKind::OneOf { matched: None };
                    eval.errors
                        .push(ValidationError::new(loc, vloc, kind).with_causes(failures));
                }
            }
        }

        if let Some(sid) = schema.if_schema {
            let (branch, name) = match self.validate(sid, v, vloc) {
                Ok(uneval) => {
                    eval.uneval.merge(&uneval);
                    (schema.then_schema, "then")
                }
                Err(_) => (schema.else_schema, "else"),
            };
            if let Some(branch) = branch {
                match self.validate(branch, v, vloc) {
                    Ok(uneval) => eval.uneval.merge(&uneval),
                    Err(err) => {
                        let kind = ErrorKind::Conditional {
                            branch: name.to_string(),
                        };
                        eval.errors
                            .push(ValidationError::new(loc, vloc, kind).with_causes(vec![err]));
                    }
                }
            }
        }
    }

    fn check_unevaluated(
        &mut self,
        schema: &'g Schema,
        v: &Value,
        vloc: &InstanceLocation,
        eval: &mut Evaluation,
    ) {
        match v {
            Value::Object(obj) => {
                let Some(sid) = schema.unevaluated_properties else {
                    return;
                };
                for (name, pv) in obj {
                    if eval.uneval.props.contains(name) {
                        if let Err(err) = self.validate(sid, pv, &vloc.property(name.as_str())) {
                            eval.errors.push(err);
                        }
                    }
                }
                eval.uneval.props.clear();
            }
            Value::Array(arr) => {
                let Some(sid) = schema.unevaluated_items else {
                    return;
                };
                for (i, item) in arr.iter().enumerate() {
                    if eval.uneval.items.contains(&i) {
                        if let Err(err) = self.validate(sid, item, &vloc.index(i)) {
                            eval.errors.push(err);
                        }
                    }
                }
                eval.uneval.items.clear();
            }
            _ => {}
        }
    }
}

fn check_number(schema: &Schema, n: &BigDecimal, vloc: &InstanceLocation, eval: &mut Evaluation) {
    let loc = schema.location.as_str();
    let bound = |kind: fn(BigDecimal, BigDecimal) -> ErrorKind, want: &BigDecimal| {
        ValidationError::new(loc, vloc, kind(n.clone(), want.clone()))
    };

    if let Some(min) = &schema.minimum {
        if n < min {
            eval.errors
                .push(bound(|got, want| ErrorKind::Minimum { got, want }, min));
        }
    }
    if let Some(max) = &schema.maximum {
        if n > max {
            eval.errors
                .push(bound(|got, want| ErrorKind::Maximum { got, want }, max));
        }
    }
    if let Some(min) = &schema.exclusive_minimum {
        if n <= min {
            eval.errors
                .push(bound(|got, want| ErrorKind::ExclusiveMinimum { got, want }, min));
        }
    }
    if let Some(max) = &schema.exclusive_maximum {
        if n >= max {
            eval.errors
                .push(bound(|got, want| ErrorKind::ExclusiveMaximum { got, want }, max));
        }
    }
    if let Some(divisor) = &schema.multiple_of {
        if !is_multiple_of(n, divisor) {
            eval.errors
                .push(bound(|got, want| ErrorKind::MultipleOf { got, want }, divisor));
        }
    }
}

/// Exact divisibility; the remainder of two decimals is computed without rounding.
fn is_multiple_of(n: &BigDecimal, divisor: &BigDecimal) -> bool {
    if divisor.is_zero() {
        return false;
    }
    (n.clone() % divisor.clone()).is_zero()
}

fn missing_properties(obj: &Map, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !obj.contains_key(*name))
        .cloned()
        .collect()
}

fn incomparable(
    schema: &Schema,
    vloc: &InstanceLocation,
    keyword: &str,
    err: schema_core::ValueError,
) -> ValidationError {
    let kind = ErrorKind::Incomparable {
        keyword: keyword.to_string(),
        reason: err.to_string(),
    };
    ValidationError::new(&schema.location, vloc, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_multiple_of_is_exact() {
        assert!(is_multiple_of(&dec("0.3"), &dec("0.1")));
        assert!(is_multiple_of(&dec("4.5"), &dec("1.5")));
        assert!(!is_multiple_of(&dec("0.35"), &dec("0.1")));
        assert!(is_multiple_of(&dec("1e308"), &dec("1")));
    }

    #[test]
    fn test_uneval_merge() {
        let mut base = Uneval {
            props: ["a", "b", "c"].into_iter().map(String::from).collect(),
            items: [0, 1, 2].into_iter().collect(),
        };
        let other = Uneval {
            props: ["b", "c", "z"].into_iter().map(String::from).collect(),
            items: [2].into_iter().collect(),
        };
        base.merge(&other);

        let mut props: Vec<&String> = base.props.iter().collect();
        props.sort();
        assert_eq!(props, vec!["b", "c"]);
        assert_eq!(base.items.into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_missing_properties() {
        let obj: Map = [("a".to_string(), Value::Null)].into_iter().collect();
        let required = vec!["a".to_string(), "b".to_string()];
        assert_eq!(missing_properties(&obj, &required), vec!["b".to_string()]);
    }
}
