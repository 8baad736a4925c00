//! Variable declarations: type resolution, data location rules and initial
//! values.

use crate::{
    ast::{
        ast::{
            DataLocationKeyword::{self, Calldata, Memory, Storage},
            Visibility,
        },
        declarations::VariableDeclaration,
    },
    errors::errors::{ErrorImpl, InternalError},
    Span,
};

use super::{
    abi::{abi_encodable, type_supported_by_legacy_encoder},
    expressions::expect_type,
    type_checker::TypeChecker,
    types::{DataLocation, Type},
};

/// Where a variable is declared; decides which data locations it may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableContext {
    State,
    Parameter {
        visibility: Visibility,
        is_library: bool,
        is_return: bool,
    },
    Local,
    EventParameter,
    MessageParameter,
    CatchParameter,
}

impl VariableContext {
    fn allowed_locations(&self) -> &'static [DataLocationKeyword] {
        match self {
            VariableContext::State | VariableContext::EventParameter | VariableContext::MessageParameter => &[],
            VariableContext::Parameter { is_library: true, .. } => &[Storage, Memory, Calldata],
            VariableContext::Parameter { visibility, .. } if visibility.is_externally_visible() => &[Memory, Calldata],
            VariableContext::Parameter { .. } | VariableContext::Local => &[Storage, Memory, Calldata],
            VariableContext::CatchParameter => &[Memory],
        }
    }

    fn description(&self) -> &'static str {
        match self {
            VariableContext::State => "state variable",
            VariableContext::Parameter { is_return: true, .. } => "return parameter in function",
            VariableContext::Parameter { .. } => "parameter in function",
            VariableContext::Local => "variable",
            VariableContext::EventParameter => "event parameter",
            VariableContext::MessageParameter => "message parameter",
            VariableContext::CatchParameter => "parameter in catch clause",
        }
    }
}

fn quoted_list(locations: &[DataLocationKeyword]) -> String {
    let quoted: Vec<String> = locations.iter().map(|location| format!("\"{}\"", location)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

fn declaration_span(variable: &VariableDeclaration) -> &Span {
    variable.type_name.as_ref().map_or(&variable.span, |type_name| &type_name.span)
}

/// Resolves and annotates the type of `variable`. Initial values are left to
/// the caller.
pub fn declare_variable(
    checker: &mut TypeChecker,
    variable: &VariableDeclaration,
    context: VariableContext,
) -> Result<Type, InternalError> {
    let type_ = match checker.declared_variable_type(variable)? {
        Ok(type_) => type_,
        Err(error) => {
            checker.record_error(error, declaration_span(variable));
            Type::Invalid
        }
    };
    if !type_.is_invalid() {
        check_data_location(checker, variable, &type_, context);
        if let VariableContext::Parameter {
            visibility, is_library, ..
        } = context
        {
            if visibility.is_externally_visible() {
                check_abi_encodable(checker, &type_, is_library, &variable.span, "public or external functions");
            }
        }
    }
    checker.annotations.annotate_variable(variable.id, type_.clone())?;
    Ok(type_)
}

fn check_data_location(checker: &mut TypeChecker, variable: &VariableDeclaration, type_: &Type, context: VariableContext) {
    let keyword = variable.location;
    let mut report = |message: String| {
        checker.record_error(ErrorImpl::InvalidDataLocation { message }, &variable.span);
    };

    if !type_.is_reference_type() {
        if keyword != DataLocationKeyword::Default {
            report(format!(
                "Data location can only be specified for array, struct or mapping types, but \"{}\" was given.",
                keyword
            ));
        }
        return;
    }

    let allowed = context.allowed_locations();
    if allowed.is_empty() {
        if keyword != DataLocationKeyword::Default {
            report(format!("Data location cannot be specified for {}.", context.description()));
        }
        return;
    }

    if matches!(type_, Type::Mapping(..)) {
        if keyword != Storage || !allowed.contains(&Storage) {
            report(String::from(
                "Mapping types can only have a data location of \"storage\" and thus only be parameters or return variables for internal or library functions.",
            ));
        }
        return;
    }

    if !allowed.contains(&keyword) {
        let given = match keyword {
            DataLocationKeyword::Default => String::from("none"),
            other => format!("\"{}\"", other),
        };
        report(format!(
            "Data location must be {} for {}, but {} was given.",
            quoted_list(allowed),
            context.description(),
            given
        ));
    }
}

/// Requires `type_` to have an ABI representation, under the legacy encoder
/// rules when the source unit has not opted into v2.
pub fn check_abi_encodable(checker: &mut TypeChecker, type_: &Type, is_library: bool, span: &Span, usage: &str) {
    if is_library && type_.data_location() == Some(DataLocation::Storage) {
        return;
    }
    if !abi_encodable(type_, &*checker) {
        checker.record_error(
            ErrorImpl::NotAbiEncodable {
                type_: type_.to_string(),
                message: format!("Internal or recursive type is not allowed for {}.", usage),
            },
            span,
        );
    } else if !checker.use_abi_coder_v2() && !type_supported_by_legacy_encoder(type_, is_library, &*checker) {
        checker.record_error(
            ErrorImpl::NotAbiEncodable {
                type_: type_.to_string(),
                message: String::from(
                    "This type is only supported in ABI coder v2. Use \"pragma abicoder v2;\" to enable the feature.",
                ),
            },
            span,
        );
    }
}

/// Constant and immutable rules, then the initial value against the declared
/// type.
pub fn check_variable_value<'a>(
    checker: &mut TypeChecker<'a>,
    variable: &'a VariableDeclaration,
    type_: &Type,
) -> Result<(), InternalError> {
    let invalid = |message: &str| ErrorImpl::InvalidDeclaration {
        message: String::from(message),
    };
    if variable.is_constant() {
        let byte_array = matches!(type_, Type::Array(array) if array.is_byte_array());
        if !type_.is_value_type() && !byte_array && !type_.is_invalid() {
            checker.record_error(invalid("Constants of non-value type not yet implemented."), &variable.span);
        }
        if variable.value.is_none() {
            checker.record_error(invalid("Uninitialized \"constant\" variable."), &variable.span);
        }
    }
    if variable.is_immutable() && !type_.is_value_type() && !type_.is_invalid() {
        checker.record_error(invalid("Immutable variables cannot have a non-value type."), &variable.span);
    }
    if let Some(value) = &variable.value {
        if matches!(type_, Type::Mapping(..)) && variable.is_state_variable {
            checker.record_error(invalid("Mappings cannot be initialized."), &value.span);
        }
        expect_type(checker, value, type_)?;
    }
    Ok(())
}
