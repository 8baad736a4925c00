//! Semantic types and the relations between them.
//!
//! Unlike `ast::types::TypeName`, which is what the user wrote, a `Type` is
//! fully resolved: `uint` is `uint256`, `S[]` carries its data location, and
//! literals keep their exact value until a context fixes a concrete type.

use std::fmt::Display;

use serde::Serialize;

use crate::ast::{ast::NodeId, ast::StateMutability, declarations::ContractKind};

use super::rational::Rational;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataLocation {
    Storage,
    Memory,
    CallData,
}

impl Display for DataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataLocation::Storage => "storage",
            DataLocation::Memory => "memory",
            DataLocation::CallData => "calldata",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayKind {
    Ordinary(Box<Type>),
    Bytes,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub kind: ArrayKind,
    /// `None` for dynamically-sized arrays.
    pub length: Option<u64>,
    pub location: DataLocation,
    /// Storage pointers alias existing storage; references are copied into.
    pub is_pointer: bool,
}

impl ArrayType {
    pub fn is_byte_array(&self) -> bool {
        !matches!(self.kind, ArrayKind::Ordinary(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, ArrayKind::String)
    }

    /// Element type, located like the array itself.
    pub fn base_type(&self) -> Type {
        match &self.kind {
            ArrayKind::Ordinary(base) => (**base).clone(),
            ArrayKind::Bytes | ArrayKind::String => Type::FixedBytes(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub id: NodeId,
    /// Qualified name (`C.S`) for structs declared inside a contract.
    pub name: String,
    pub location: DataLocation,
    pub is_pointer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractType {
    pub id: NodeId,
    pub name: String,
    pub kind: ContractKind,
    /// Has a receive function or a payable fallback.
    pub can_receive: bool,
    pub is_super: bool,
    /// Linearized bases, most derived (this contract) first.
    pub bases: Vec<NodeId>,
}

/// How a function value is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CallKind {
    Internal,
    External,
    /// Public or external library function called through `L.f`.
    DelegateCall,
    /// `new C` contract creation.
    Creation,
    /// `new T[](n)` memory allocation.
    ObjectCreation,
    /// Asynchronous message sent to a contract instance.
    Message,
    Event,
    Send,
    Transfer,
    BareCall,
    BareDelegateCall,
    BareStaticCall,
    ArrayPush,
    ArrayPop,
    Require,
    Assert,
    Revert,
    Keccak256,
    Sha256,
    Ripemd160,
    ECRecover,
    AddMod,
    MulMod,
    GasLeft,
    BlockHash,
    Selfdestruct,
    AbiEncode,
    AbiEncodePacked,
    AbiEncodeWithSelector,
    AbiEncodeWithSignature,
    AbiDecode,
    MetaType,
}

impl CallKind {
    pub fn is_external_call(&self) -> bool {
        matches!(
            self,
            CallKind::External
                | CallKind::DelegateCall
                | CallKind::BareCall
                | CallKind::BareDelegateCall
                | CallKind::BareStaticCall
        )
    }

    pub fn is_bare_call(&self) -> bool {
        matches!(self, CallKind::BareCall | CallKind::BareDelegateCall | CallKind::BareStaticCall)
    }

    pub fn is_abi_encode(&self) -> bool {
        matches!(
            self,
            CallKind::AbiEncode
                | CallKind::AbiEncodePacked
                | CallKind::AbiEncodeWithSelector
                | CallKind::AbiEncodeWithSignature
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub kind: CallKind,
    pub parameter_types: Vec<Type>,
    pub return_types: Vec<Type>,
    pub parameter_names: Vec<String>,
    pub return_names: Vec<String>,
    pub state_mutability: StateMutability,
    pub declaration: Option<NodeId>,
    /// Accepts any number of arguments of any type (`abi.encode`).
    pub arbitrary_parameters: bool,
    pub gas_set: bool,
    pub value_set: bool,
    pub salt_set: bool,
    /// Library function attached with `using ... for`, first parameter consumed.
    pub bound: bool,
}

impl FunctionType {
    pub fn new(kind: CallKind, parameter_types: Vec<Type>, return_types: Vec<Type>, state_mutability: StateMutability) -> Self {
        FunctionType {
            kind,
            parameter_names: vec![String::new(); parameter_types.len()],
            return_names: vec![String::new(); return_types.len()],
            parameter_types,
            return_types,
            state_mutability,
            declaration: None,
            arbitrary_parameters: false,
            gas_set: false,
            value_set: false,
            salt_set: false,
            bound: false,
        }
    }

    pub fn with_arbitrary_parameters(mut self) -> Self {
        self.arbitrary_parameters = true;
        self
    }

    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    /// Type of the call expression: the single return type, or a tuple.
    pub fn call_result(&self) -> Type {
        if self.return_types.len() == 1 {
            self.return_types[0].clone()
        } else {
            Type::Tuple(self.return_types.iter().cloned().map(Some).collect())
        }
    }

    fn same_signature(&self, other: &FunctionType) -> bool {
        self.kind == other.kind
            && self.parameter_types == other.parameter_types
            && self.return_types == other.return_types
            && self.bound == other.bound
            && self.gas_set == other.gas_set
            && self.value_set == other.value_set
    }

    /// Whether the parameter lists are identical, used to detect overrides.
    pub fn has_equal_parameter_types(&self, other: &FunctionType) -> bool {
        self.parameter_types == other.parameter_types
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MagicKind {
    Message,
    Block,
    Transaction,
    Abi,
    /// `type(T)`
    MetaType(Box<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalNumber {
    pub value: Rational,
    /// Byte width of a hex literal with an even number of digits, which may
    /// be assigned to a fixed bytes type of exactly that width.
    pub compatible_bytes: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer { bits: u16, signed: bool },
    RationalNumber(RationalNumber),
    StringLiteral(String),
    Bool,
    Address { payable: bool },
    FixedBytes(u8),
    Array(ArrayType),
    Mapping(Box<Type>, Box<Type>),
    Struct(StructType),
    Contract(ContractType),
    Function(Box<FunctionType>),
    /// Components are `None` only for omitted slots of an assignment target.
    Tuple(Vec<Option<Type>>),
    /// The type itself used as a value, e.g. `uint` in `uint(x)`.
    TypeType(Box<Type>),
    Magic(MagicKind),
    Modifier(Vec<Type>),
    /// Pending result of a message send; `await` yields the return types.
    MessageHandle(Vec<Type>),
    /// Several candidate functions that a call site has not narrowed yet.
    Overloaded(Vec<Type>),
    /// Recorded after a diagnostic to silence follow-up errors.
    Invalid,
}

impl Type {
    pub fn uint(bits: u16) -> Type {
        Type::Integer { bits, signed: false }
    }

    pub fn int(bits: u16) -> Type {
        Type::Integer { bits, signed: true }
    }

    pub fn uint256() -> Type {
        Type::uint(256)
    }

    pub fn address() -> Type {
        Type::Address { payable: false }
    }

    pub fn address_payable() -> Type {
        Type::Address { payable: true }
    }

    pub fn rational(value: Rational) -> Type {
        Type::RationalNumber(RationalNumber {
            value,
            compatible_bytes: None,
        })
    }

    pub fn bytes(location: DataLocation) -> Type {
        Type::Array(ArrayType {
            kind: ArrayKind::Bytes,
            length: None,
            location,
            is_pointer: false,
        })
    }

    pub fn string(location: DataLocation) -> Type {
        Type::Array(ArrayType {
            kind: ArrayKind::String,
            length: None,
            location,
            is_pointer: false,
        })
    }

    pub fn bytes_memory() -> Type {
        Type::bytes(DataLocation::Memory)
    }

    pub fn string_memory() -> Type {
        Type::string(DataLocation::Memory)
    }

    pub fn array(base: Type, length: Option<u64>, location: DataLocation) -> Type {
        Type::Array(ArrayType {
            kind: ArrayKind::Ordinary(Box::new(base.with_location(location, true))),
            length,
            location,
            is_pointer: false,
        })
    }

    pub fn mapping(key: Type, value: Type) -> Type {
        Type::Mapping(
            Box::new(key.with_location(DataLocation::Memory, false)),
            Box::new(value.with_location(DataLocation::Storage, true)),
        )
    }

    pub fn empty_tuple() -> Type {
        Type::Tuple(vec![])
    }

    pub fn tuple(types: Vec<Type>) -> Type {
        Type::Tuple(types.into_iter().map(Some).collect())
    }

    pub fn function(function: FunctionType) -> Type {
        Type::Function(Box::new(function))
    }

    pub fn is_invalid(&self) -> bool {
        match self {
            Type::Invalid => true,
            Type::Tuple(components) => components.iter().flatten().any(Type::is_invalid),
            _ => false,
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Type::Integer { .. }
                | Type::RationalNumber(_)
                | Type::Bool
                | Type::Address { .. }
                | Type::FixedBytes(_)
                | Type::Contract(_)
                | Type::Function(_)
        )
    }

    pub fn is_reference_type(&self) -> bool {
        matches!(self, Type::Array(_) | Type::Struct(_) | Type::Mapping(..))
    }

    pub fn data_location(&self) -> Option<DataLocation> {
        match self {
            Type::Array(array) => Some(array.location),
            Type::Struct(structure) => Some(structure.location),
            Type::Mapping(..) => Some(DataLocation::Storage),
            _ => None,
        }
    }

    pub fn is_storage_pointer(&self) -> bool {
        match self {
            Type::Array(array) => array.location == DataLocation::Storage && array.is_pointer,
            Type::Struct(structure) => structure.location == DataLocation::Storage && structure.is_pointer,
            _ => false,
        }
    }

    /// Reference type living in storage that is not a pointer.
    pub fn is_storage_reference(&self) -> bool {
        self.data_location() == Some(DataLocation::Storage) && !self.is_storage_pointer() && !matches!(self, Type::Mapping(..))
    }

    pub fn is_dynamically_sized(&self) -> bool {
        matches!(self, Type::Array(array) if array.length.is_none())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. })
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Copy of a reference type moved to `location`; value types are returned unchanged.
    pub fn with_location(&self, location: DataLocation, is_pointer: bool) -> Type {
        match self {
            Type::Array(array) => Type::Array(ArrayType {
                kind: match &array.kind {
                    ArrayKind::Ordinary(base) => ArrayKind::Ordinary(Box::new(base.with_location(location, true))),
                    other => other.clone(),
                },
                length: array.length,
                location,
                is_pointer,
            }),
            Type::Struct(structure) => Type::Struct(StructType {
                location,
                is_pointer,
                ..structure.clone()
            }),
            other => other.clone(),
        }
    }

    /// The concrete type a literal assumes when nothing else constrains it.
    pub fn mobile_type(&self) -> Option<Type> {
        match self {
            Type::RationalNumber(number) => number
                .value
                .smallest_integer_type()
                .map(|(bits, signed)| Type::Integer { bits, signed }),
            Type::StringLiteral(_) => Some(Type::string_memory()),
            other => Some(other.clone()),
        }
    }

    pub fn is_implicitly_convertible_to(&self, target: &Type) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            (Type::Invalid, _) | (_, Type::Invalid) => true,
            (Type::Integer { bits, signed }, Type::Integer { bits: target_bits, signed: target_signed }) => {
                if *target_signed {
                    if *signed {
                        bits <= target_bits
                    } else {
                        bits < target_bits
                    }
                } else {
                    !signed && bits <= target_bits
                }
            }
            (Type::RationalNumber(number), Type::Integer { bits, signed }) => number.value.fits_integer(*bits, *signed),
            (Type::RationalNumber(number), Type::FixedBytes(size)) => {
                number.value.is_zero() || number.compatible_bytes == Some(*size)
            }
            (Type::RationalNumber(a), Type::RationalNumber(b)) => a.value == b.value,
            (Type::StringLiteral(value), Type::FixedBytes(size)) => value.len() <= *size as usize,
            (Type::StringLiteral(_), Type::Array(array)) => {
                array.is_byte_array()
                    && array.location != DataLocation::CallData
                    && !(array.location == DataLocation::Storage && array.is_pointer)
            }
            (Type::FixedBytes(size), Type::FixedBytes(target_size)) => size <= target_size,
            (Type::Address { .. }, Type::Address { payable: false }) => true,
            (Type::Contract(contract), Type::Contract(target_contract)) => {
                !contract.is_super && !target_contract.is_super && contract.bases.contains(&target_contract.id)
            }
            (Type::Array(array), Type::Array(target_array)) => array_convertible(array, target_array),
            (Type::Struct(structure), Type::Struct(target_struct)) => {
                if structure.id != target_struct.id {
                    false
                } else if target_struct.location == DataLocation::Storage
                    && structure.location != DataLocation::Storage
                    && target_struct.is_pointer
                {
                    false
                } else {
                    !(target_struct.location == DataLocation::CallData && structure.location != DataLocation::CallData)
                }
            }
            (Type::Tuple(components), Type::Tuple(target_components)) => {
                components.len() == target_components.len()
                    && components.iter().zip(target_components).all(|(source, target)| match (source, target) {
                        (_, None) => true,
                        (None, Some(_)) => false,
                        (Some(source), Some(target)) => source.is_implicitly_convertible_to(target),
                    })
            }
            (Type::Function(function), Type::Function(target_function)) => {
                let kinds_match = function.kind == target_function.kind
                    || (function.kind == CallKind::DelegateCall && target_function.kind == CallKind::Internal);
                kinds_match
                    && function.parameter_types == target_function.parameter_types
                    && function.return_types == target_function.return_types
                    && function.bound == target_function.bound
                    && function.gas_set == target_function.gas_set
                    && function.value_set == target_function.value_set
                    && mutability_convertible(function.state_mutability, target_function.state_mutability)
            }
            _ => false,
        }
    }

    pub fn is_explicitly_convertible_to(&self, target: &Type) -> bool {
        if self.is_implicitly_convertible_to(target) {
            return true;
        }
        match (self, target) {
            (Type::Integer { bits, signed }, Type::Integer { bits: target_bits, signed: target_signed }) => {
                signed == target_signed || bits == target_bits
            }
            (Type::Integer { bits, .. }, Type::FixedBytes(size)) => *bits == *size as u16 * 8,
            (Type::FixedBytes(size), Type::Integer { bits, .. }) => *bits == *size as u16 * 8,
            (Type::Integer { bits: 160, signed: false }, Type::Address { payable: false }) => true,
            (Type::RationalNumber(number), Type::Address { payable: false }) => {
                number.value.is_integer() && !number.value.is_negative() && number.value.integer_bits() <= 160
            }
            (Type::RationalNumber(number), Type::FixedBytes(size)) => {
                number.value.is_integer()
                    && !number.value.is_negative()
                    && number.value.integer_bits() <= *size as usize * 8
            }
            (Type::Address { .. }, Type::Integer { bits: 160, signed: false }) => true,
            (Type::Address { .. }, Type::FixedBytes(20)) => true,
            (Type::FixedBytes(20), Type::Address { payable: false }) => true,
            (Type::Address { .. }, Type::Address { payable: true }) => true,
            (Type::Contract(contract), Type::Address { payable }) => !contract.is_super && (!payable || contract.can_receive),
            (Type::Address { .. }, Type::Contract(contract)) => !contract.is_super,
            (Type::FixedBytes(_), Type::FixedBytes(_)) => true,
            (Type::Array(array), Type::Array(target_array)) => {
                array.is_byte_array()
                    && target_array.is_byte_array()
                    && array.location == target_array.location
                    && array.length.is_none()
                    && target_array.length.is_none()
            }
            (Type::Array(array), Type::FixedBytes(_)) => {
                matches!(array.kind, ArrayKind::Bytes) && array.location != DataLocation::Storage
            }
            _ => false,
        }
    }

    /// Binary operators and conditionals operate on the mobile type of one
    /// side that the other side converts to.
    pub fn common_type(a: &Type, b: &Type) -> Option<Type> {
        let a_mobile = a.mobile_type()?;
        let b_mobile = b.mobile_type()?;
        if b.is_implicitly_convertible_to(&a_mobile) {
            Some(a_mobile)
        } else if a.is_implicitly_convertible_to(&b_mobile) {
            Some(b_mobile)
        } else {
            None
        }
    }

    /// Display without data location, used for nested types.
    pub fn short_name(&self) -> String {
        self.render(true)
    }

    fn render(&self, short: bool) -> String {
        match self {
            Type::Integer { bits, signed } => format!("{}int{}", if *signed { "" } else { "u" }, bits),
            Type::RationalNumber(number) => {
                let value = number.value.to_string();
                let value = if value.len() > 32 && number.value.is_integer() {
                    abbreviate_digits(&value)
                } else {
                    value
                };
                if number.value.is_integer() {
                    format!("int_const {}", value)
                } else {
                    format!("rational_const {}", value)
                }
            }
            Type::StringLiteral(value) => {
                if value.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
                    format!("literal_string \"{}\"", value)
                } else {
                    let hex: String = value.bytes().map(|b| format!("{:02x}", b)).collect();
                    format!("literal_string hex\"{}\"", hex)
                }
            }
            Type::Bool => String::from("bool"),
            Type::Address { payable } => {
                if *payable {
                    String::from("address payable")
                } else {
                    String::from("address")
                }
            }
            Type::FixedBytes(size) => format!("bytes{}", size),
            Type::Array(array) => {
                let mut name = match &array.kind {
                    ArrayKind::Bytes => String::from("bytes"),
                    ArrayKind::String => String::from("string"),
                    ArrayKind::Ordinary(base) => match array.length {
                        Some(length) => format!("{}[{}]", base.short_name(), length),
                        None => format!("{}[]", base.short_name()),
                    },
                };
                if !short {
                    name.push(' ');
                    name.push_str(&location_suffix(array.location, array.is_pointer));
                }
                name
            }
            Type::Mapping(key, value) => format!("mapping({} => {})", key.short_name(), value.short_name()),
            Type::Struct(structure) => {
                if short {
                    format!("struct {}", structure.name)
                } else {
                    format!("struct {} {}", structure.name, location_suffix(structure.location, structure.is_pointer))
                }
            }
            Type::Contract(contract) => {
                let prefix = if contract.kind == ContractKind::Library { "library" } else { "contract" };
                if contract.is_super {
                    format!("{} super {}", prefix, contract.name)
                } else {
                    format!("{} {}", prefix, contract.name)
                }
            }
            Type::Function(function) => {
                let parameters: Vec<String> = function.parameter_types.iter().map(|t| t.render(short)).collect();
                let mut name = format!("function ({})", parameters.join(","));
                if function.state_mutability != StateMutability::NonPayable {
                    name.push_str(&format!(" {}", function.state_mutability));
                }
                if function.kind == CallKind::External {
                    name.push_str(" external");
                }
                if !function.return_types.is_empty() {
                    let returns: Vec<String> = function.return_types.iter().map(|t| t.render(short)).collect();
                    name.push_str(&format!(" returns ({})", returns.join(",")));
                }
                name
            }
            Type::Tuple(components) => {
                let components: Vec<String> = components
                    .iter()
                    .map(|component| component.as_ref().map(|t| t.render(short)).unwrap_or_default())
                    .collect();
                format!("tuple({})", components.join(","))
            }
            Type::TypeType(actual) => format!("type({})", actual.render(short)),
            Type::Magic(kind) => match kind {
                MagicKind::Message => String::from("msg"),
                MagicKind::Block => String::from("block"),
                MagicKind::Transaction => String::from("tx"),
                MagicKind::Abi => String::from("abi"),
                MagicKind::MetaType(actual) => format!("type({})", actual.render(short)),
            },
            Type::Modifier(parameters) => {
                let parameters: Vec<String> = parameters.iter().map(|t| t.render(short)).collect();
                format!("modifier ({})", parameters.join(","))
            }
            Type::MessageHandle(returns) => {
                let returns: Vec<String> = returns.iter().map(|t| t.render(short)).collect();
                format!("message_handle({})", returns.join(","))
            }
            Type::Overloaded(_) => String::from("overloaded function set"),
            Type::Invalid => String::from("<invalid>"),
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(false))
    }
}

impl Serialize for Type {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

fn location_suffix(location: DataLocation, is_pointer: bool) -> String {
    match location {
        DataLocation::Storage if is_pointer => String::from("storage pointer"),
        DataLocation::Storage => String::from("storage ref"),
        other => other.to_string(),
    }
}

fn abbreviate_digits(value: &str) -> String {
    let (sign, digits) = match value.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", value),
    };
    if digits.len() <= 32 {
        return value.to_string();
    }
    let omitted = digits.len() - 8;
    format!(
        "{}{}...({} digits omitted)...{}",
        sign,
        &digits[..4],
        omitted,
        &digits[digits.len() - 4..]
    )
}

fn mutability_convertible(from: StateMutability, to: StateMutability) -> bool {
    if from == to {
        return true;
    }
    match to {
        StateMutability::View => from == StateMutability::Pure,
        StateMutability::NonPayable => true,
        StateMutability::Pure | StateMutability::Payable => false,
    }
}

fn array_convertible(array: &ArrayType, target: &ArrayType) -> bool {
    if array.is_byte_array() != target.is_byte_array() || array.is_string() != target.is_string() {
        return false;
    }
    if target.location == DataLocation::Storage && array.location != DataLocation::Storage && target.is_pointer {
        return false;
    }
    if target.location == DataLocation::CallData && array.location != DataLocation::CallData {
        return false;
    }
    if target.location == DataLocation::Storage && !target.is_pointer {
        // copied element by element
        if !array.base_type().is_implicitly_convertible_to(&target.base_type()) {
            return false;
        }
        match (array.length, target.length) {
            (_, None) => true,
            (Some(length), Some(target_length)) => target_length >= length,
            (None, Some(_)) => false,
        }
    } else {
        let base = array.base_type().with_location(array.location, true);
        let target_base = target.base_type().with_location(array.location, true);
        base == target_base && array.length == target.length
    }
}

/// Identity of a function signature used for overload de-duplication.
pub fn same_function_signature(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Function(a), Type::Function(b)) => a.same_signature(b),
        _ => a == b,
    }
}
