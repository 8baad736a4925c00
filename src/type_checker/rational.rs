//! Exact arithmetic for number literals.
//!
//! Literal expressions are folded at compile time with unbounded precision,
//! so `2**255 * 2 / 4` is exact and `0.5 * 4` is the integer `2`. Values are
//! stored as normalized fractions over little-endian `u32` limbs. Results whose
//! numerator or denominator exceed `MAX_BITS` are rejected.

use std::{cmp::Ordering, fmt::Display};

pub const MAX_BITS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BigUint {
    limbs: Vec<u32>,
}

impl BigUint {
    pub fn zero() -> Self {
        BigUint { limbs: vec![] }
    }

    pub fn one() -> Self {
        BigUint::from_u64(1)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut number = BigUint {
            limbs: vec![value as u32, (value >> 32) as u32],
        };
        number.normalize();
        number
    }

    fn normalize(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.limbs.len() == 1 && self.limbs[0] == 1
    }

    pub fn bits(&self) -> usize {
        match self.limbs.last() {
            None => 0,
            Some(top) => (self.limbs.len() - 1) * 32 + (32 - top.leading_zeros() as usize),
        }
    }

    pub fn bit(&self, index: usize) -> bool {
        self.limbs
            .get(index / 32)
            .map(|limb| (limb >> (index % 32)) & 1 == 1)
            .unwrap_or(false)
    }

    fn set_bit(&mut self, index: usize) {
        let limb = index / 32;
        if self.limbs.len() <= limb {
            self.limbs.resize(limb + 1, 0);
        }
        self.limbs[limb] |= 1 << (index % 32);
    }

    pub fn to_u64(&self) -> Option<u64> {
        match self.limbs.len() {
            0 => Some(0),
            1 => Some(self.limbs[0] as u64),
            2 => Some(self.limbs[0] as u64 | ((self.limbs[1] as u64) << 32)),
            _ => None,
        }
    }

    pub fn add(&self, other: &BigUint) -> BigUint {
        let length = self.limbs.len().max(other.limbs.len());
        let mut limbs = Vec::with_capacity(length + 1);
        let mut carry = 0u64;
        for i in 0..length {
            let sum = *self.limbs.get(i).unwrap_or(&0) as u64 + *other.limbs.get(i).unwrap_or(&0) as u64 + carry;
            limbs.push(sum as u32);
            carry = sum >> 32;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
        let mut result = BigUint { limbs };
        result.normalize();
        result
    }

    /// `self - other`; callers guarantee `self >= other`.
    pub fn sub(&self, other: &BigUint) -> BigUint {
        let mut limbs = Vec::with_capacity(self.limbs.len());
        let mut borrow = 0i64;
        for i in 0..self.limbs.len() {
            let mut difference = self.limbs[i] as i64 - *other.limbs.get(i).unwrap_or(&0) as i64 - borrow;
            if difference < 0 {
                difference += 1 << 32;
                borrow = 1;
            } else {
                borrow = 0;
            }
            limbs.push(difference as u32);
        }
        let mut result = BigUint { limbs };
        result.normalize();
        result
    }

    pub fn mul(&self, other: &BigUint) -> BigUint {
        if self.is_zero() || other.is_zero() {
            return BigUint::zero();
        }
        let mut limbs = vec![0u32; self.limbs.len() + other.limbs.len()];
        for (i, &a) in self.limbs.iter().enumerate() {
            let mut carry = 0u64;
            for (j, &b) in other.limbs.iter().enumerate() {
                let current = limbs[i + j] as u64 + a as u64 * b as u64 + carry;
                limbs[i + j] = current as u32;
                carry = current >> 32;
            }
            let mut k = i + other.limbs.len();
            while carry > 0 {
                let current = limbs[k] as u64 + carry;
                limbs[k] = current as u32;
                carry = current >> 32;
                k += 1;
            }
        }
        let mut result = BigUint { limbs };
        result.normalize();
        result
    }

    pub fn mul_small(&self, factor: u32) -> BigUint {
        self.mul(&BigUint::from_u64(factor as u64))
    }

    /// Quotient and remainder. `divisor` must be non-zero.
    pub fn divmod(&self, divisor: &BigUint) -> (BigUint, BigUint) {
        if self.cmp(divisor) == Ordering::Less {
            return (BigUint::zero(), self.clone());
        }
        let mut quotient = BigUint::zero();
        let mut remainder = BigUint::zero();
        for i in (0..self.bits()).rev() {
            remainder = remainder.shl(1);
            if self.bit(i) {
                remainder.set_bit(0);
            }
            if remainder.cmp(divisor) != Ordering::Less {
                remainder = remainder.sub(divisor);
                quotient.set_bit(i);
            }
        }
        quotient.normalize();
        (quotient, remainder)
    }

    fn divmod_small(&self, divisor: u32) -> (BigUint, u32) {
        let mut limbs = vec![0u32; self.limbs.len()];
        let mut remainder = 0u64;
        for i in (0..self.limbs.len()).rev() {
            let current = (remainder << 32) | self.limbs[i] as u64;
            limbs[i] = (current / divisor as u64) as u32;
            remainder = current % divisor as u64;
        }
        let mut quotient = BigUint { limbs };
        quotient.normalize();
        (quotient, remainder as u32)
    }

    pub fn shl(&self, amount: usize) -> BigUint {
        if self.is_zero() {
            return BigUint::zero();
        }
        let limb_shift = amount / 32;
        let bit_shift = amount % 32;
        let mut limbs = vec![0u32; limb_shift];
        let mut carry = 0u32;
        for &limb in &self.limbs {
            if bit_shift == 0 {
                limbs.push(limb);
            } else {
                limbs.push((limb << bit_shift) | carry);
                carry = limb >> (32 - bit_shift);
            }
        }
        if carry > 0 {
            limbs.push(carry);
        }
        let mut result = BigUint { limbs };
        result.normalize();
        result
    }

    pub fn shr(&self, amount: usize) -> BigUint {
        let limb_shift = amount / 32;
        if limb_shift >= self.limbs.len() {
            return BigUint::zero();
        }
        let bit_shift = amount % 32;
        let source = &self.limbs[limb_shift..];
        let mut limbs = Vec::with_capacity(source.len());
        for i in 0..source.len() {
            if bit_shift == 0 {
                limbs.push(source[i]);
            } else {
                let high = source.get(i + 1).map(|next| next << (32 - bit_shift)).unwrap_or(0);
                limbs.push((source[i] >> bit_shift) | high);
            }
        }
        let mut result = BigUint { limbs };
        result.normalize();
        result
    }

    pub fn gcd(&self, other: &BigUint) -> BigUint {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let (_, remainder) = a.divmod(&b);
            a = b;
            b = remainder;
        }
        a
    }

    /// `None` when the result would exceed `MAX_BITS`.
    pub fn pow(&self, exponent: u64) -> Option<BigUint> {
        if exponent == 0 {
            return Some(BigUint::one());
        }
        if self.is_zero() || self.is_one() {
            return Some(self.clone());
        }
        if (self.bits() as u64 - 1).saturating_mul(exponent) > MAX_BITS as u64 {
            return None;
        }
        let mut result = BigUint::one();
        let mut base = self.clone();
        let mut exponent = exponent;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.mul(&base);
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.mul(&base);
            }
        }
        if result.bits() > MAX_BITS {
            None
        } else {
            Some(result)
        }
    }

    pub fn from_radix(digits: &str, radix: u32) -> Option<BigUint> {
        if digits.is_empty() {
            return None;
        }
        let mut result = BigUint::zero();
        for c in digits.chars() {
            let digit = c.to_digit(radix)?;
            result = result.mul_small(radix).add(&BigUint::from_u64(digit as u64));
        }
        Some(result)
    }

    fn bitwise(&self, other: &BigUint, op: impl Fn(u32, u32) -> u32) -> BigUint {
        let length = self.limbs.len().max(other.limbs.len());
        let mut limbs = Vec::with_capacity(length);
        for i in 0..length {
            limbs.push(op(*self.limbs.get(i).unwrap_or(&0), *other.limbs.get(i).unwrap_or(&0)));
        }
        let mut result = BigUint { limbs };
        result.normalize();
        result
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl Display for BigUint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut chunks = vec![];
        let mut current = self.clone();
        while !current.is_zero() {
            let (quotient, remainder) = current.divmod_small(1_000_000_000);
            chunks.push(remainder);
            current = quotient;
        }
        let mut text = String::new();
        for (i, chunk) in chunks.iter().rev().enumerate() {
            if i == 0 {
                text.push_str(&chunk.to_string());
            } else {
                text.push_str(&format!("{:09}", chunk));
            }
        }
        write!(f, "{}", text)
    }
}

/// Signed integer with an unbounded magnitude. Zero is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BigInt {
    negative: bool,
    magnitude: BigUint,
}

impl BigInt {
    pub fn new(negative: bool, magnitude: BigUint) -> Self {
        BigInt {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        BigInt::new(value < 0, BigUint::from_u64(value.unsigned_abs()))
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn magnitude(&self) -> &BigUint {
        &self.magnitude
    }

    pub fn neg(&self) -> BigInt {
        BigInt::new(!self.negative, self.magnitude.clone())
    }

    pub fn add(&self, other: &BigInt) -> BigInt {
        if self.negative == other.negative {
            return BigInt::new(self.negative, self.magnitude.add(&other.magnitude));
        }
        match self.magnitude.cmp(&other.magnitude) {
            Ordering::Less => BigInt::new(other.negative, other.magnitude.sub(&self.magnitude)),
            _ => BigInt::new(self.negative, self.magnitude.sub(&other.magnitude)),
        }
    }

    pub fn sub(&self, other: &BigInt) -> BigInt {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &BigInt) -> BigInt {
        BigInt::new(self.negative != other.negative, self.magnitude.mul(&other.magnitude))
    }

    fn mul_unsigned(&self, other: &BigUint) -> BigInt {
        BigInt::new(self.negative, self.magnitude.mul(other))
    }

    /// Two's complement representation over `bits` bits.
    fn to_twos_complement(&self, bits: usize) -> BigUint {
        if self.negative {
            BigUint::one().shl(bits).sub(&self.magnitude)
        } else {
            self.magnitude.clone()
        }
    }

    fn from_twos_complement(value: BigUint, bits: usize) -> BigInt {
        if value.bit(bits - 1) {
            BigInt::new(true, BigUint::one().shl(bits).sub(&value))
        } else {
            BigInt::new(false, value)
        }
    }

    fn bitwise(&self, other: &BigInt, op: impl Fn(u32, u32) -> u32) -> BigInt {
        let bits = (self.magnitude.bits().max(other.magnitude.bits()) / 32 + 2) * 32;
        let mask = BigUint::one().shl(bits).sub(&BigUint::one());
        let result = self
            .to_twos_complement(bits)
            .bitwise(&other.to_twos_complement(bits), op)
            .bitwise(&mask, |a, b| a & b);
        BigInt::from_twos_complement(result, bits)
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
        }
    }
}

impl Display for BigInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}

/// Normalized fraction: the denominator is positive and coprime to the numerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: BigInt,
    denominator: BigUint,
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl Rational {
    pub fn new(numerator: BigInt, denominator: BigUint) -> Option<Rational> {
        if denominator.is_zero() {
            return None;
        }
        let divisor = numerator.magnitude.gcd(&denominator);
        if divisor.is_zero() || divisor.is_one() {
            return Some(Rational { numerator, denominator });
        }
        let (magnitude, _) = numerator.magnitude.divmod(&divisor);
        let (denominator, _) = denominator.divmod(&divisor);
        Some(Rational {
            numerator: BigInt::new(numerator.negative, magnitude),
            denominator,
        })
    }

    pub fn zero() -> Rational {
        Rational::integer(BigInt::default())
    }

    pub fn integer(value: BigInt) -> Rational {
        Rational {
            numerator: value,
            denominator: BigUint::one(),
        }
    }

    pub fn from_i64(value: i64) -> Rational {
        Rational::integer(BigInt::from_i64(value))
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigUint {
        &self.denominator
    }

    pub fn is_integer(&self) -> bool {
        self.denominator.is_one()
    }

    pub fn is_negative(&self) -> bool {
        self.numerator.is_negative()
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// Whether the value is too large to be represented as a literal.
    pub fn exceeds_limit(&self) -> bool {
        self.numerator.magnitude.bits() > MAX_BITS || self.denominator.bits() > MAX_BITS
    }

    fn checked(value: Option<Rational>) -> Option<Rational> {
        value.filter(|value| !value.exceeds_limit())
    }

    /// Value as `u64` when it is a non-negative integer that fits.
    pub fn to_u64(&self) -> Option<u64> {
        if !self.is_integer() || self.is_negative() {
            return None;
        }
        self.numerator.magnitude.to_u64()
    }

    /// Whether the value is an integer representable in `bits` bits.
    pub fn fits_integer(&self, bits: u16, signed: bool) -> bool {
        if !self.is_integer() {
            return false;
        }
        let bits = bits as usize;
        let magnitude = &self.numerator.magnitude;
        if signed {
            if self.is_negative() {
                // -2^(bits-1) is the smallest value.
                magnitude.cmp(&BigUint::one().shl(bits - 1)) != Ordering::Greater
            } else {
                magnitude.bits() < bits
            }
        } else {
            !self.is_negative() && magnitude.bits() <= bits
        }
    }

    pub fn neg(&self) -> Rational {
        Rational {
            numerator: self.numerator.neg(),
            denominator: self.denominator.clone(),
        }
    }

    pub fn add(&self, other: &Rational) -> Option<Rational> {
        let numerator = self
            .numerator
            .mul_unsigned(&other.denominator)
            .add(&other.numerator.mul_unsigned(&self.denominator));
        Rational::checked(Rational::new(numerator, self.denominator.mul(&other.denominator)))
    }

    pub fn sub(&self, other: &Rational) -> Option<Rational> {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Rational) -> Option<Rational> {
        Rational::checked(Rational::new(
            self.numerator.mul(&other.numerator),
            self.denominator.mul(&other.denominator),
        ))
    }

    pub fn div(&self, other: &Rational) -> Option<Rational> {
        if other.is_zero() {
            return None;
        }
        let numerator = self.numerator.mul_unsigned(&other.denominator);
        let numerator = BigInt::new(numerator.negative != other.numerator.negative, numerator.magnitude);
        Rational::checked(Rational::new(numerator, self.denominator.mul(&other.numerator.magnitude)))
    }

    /// Remainder of truncating division; takes the sign of the dividend.
    pub fn rem(&self, other: &Rational) -> Option<Rational> {
        let quotient = self.div(other)?;
        let truncated = Rational::integer(BigInt::new(
            quotient.numerator.negative,
            quotient.numerator.magnitude.divmod(&quotient.denominator).0,
        ));
        self.sub(&truncated.mul(other)?)
    }

    pub fn pow(&self, exponent: &Rational) -> Option<Rational> {
        if !exponent.is_integer() {
            return None;
        }
        let power = exponent.numerator.magnitude.to_u64()?;
        if exponent.is_negative() && self.is_zero() {
            return None;
        }
        let negative = self.numerator.negative && power % 2 == 1;
        let numerator = BigInt::new(negative, self.numerator.magnitude.pow(power)?);
        let denominator = self.denominator.pow(power)?;
        let result = Rational::new(numerator, denominator)?;
        if exponent.is_negative() {
            Rational::from_i64(1).div(&result)
        } else {
            Some(result)
        }
    }

    fn shift_amount(amount: &Rational) -> Option<usize> {
        if !amount.is_integer() || amount.is_negative() {
            return None;
        }
        amount.to_u64().map(|amount| amount as usize)
    }

    pub fn shl(&self, amount: &Rational) -> Option<Rational> {
        if !self.is_integer() {
            return None;
        }
        let amount = Rational::shift_amount(amount)?;
        if amount > MAX_BITS {
            return None;
        }
        Rational::checked(Some(Rational::integer(BigInt::new(
            self.numerator.negative,
            self.numerator.magnitude.shl(amount),
        ))))
    }

    /// Arithmetic right shift, rounding towards negative infinity.
    pub fn shr(&self, amount: &Rational) -> Option<Rational> {
        if !self.is_integer() {
            return None;
        }
        let amount = Rational::shift_amount(amount)?;
        let magnitude = &self.numerator.magnitude;
        if !self.is_negative() {
            return Some(Rational::integer(BigInt::new(false, magnitude.shr(amount))));
        }
        let shifted = magnitude.shr(amount);
        let exact = shifted.shl(amount) == *magnitude;
        let shifted = if exact { shifted } else { shifted.add(&BigUint::one()) };
        Some(Rational::integer(BigInt::new(true, shifted)))
    }

    pub fn bit_and(&self, other: &Rational) -> Option<Rational> {
        self.bitwise(other, |a, b| a & b)
    }

    pub fn bit_or(&self, other: &Rational) -> Option<Rational> {
        self.bitwise(other, |a, b| a | b)
    }

    pub fn bit_xor(&self, other: &Rational) -> Option<Rational> {
        self.bitwise(other, |a, b| a ^ b)
    }

    fn bitwise(&self, other: &Rational, op: impl Fn(u32, u32) -> u32) -> Option<Rational> {
        if !self.is_integer() || !other.is_integer() {
            return None;
        }
        Some(Rational::integer(self.numerator.bitwise(&other.numerator, op)))
    }

    /// `~x`, defined as `-x - 1` on integers.
    pub fn bit_not(&self) -> Option<Rational> {
        if !self.is_integer() {
            return None;
        }
        self.neg().sub(&Rational::from_i64(1))
    }

    /// Smallest `(bits, signed)` integer type holding this value, if it is an
    /// integer that fits into 256 bits.
    pub fn smallest_integer_type(&self) -> Option<(u16, bool)> {
        if !self.is_integer() {
            return None;
        }
        let magnitude = &self.numerator.magnitude;
        if self.is_negative() {
            let bits = magnitude.sub(&BigUint::one()).bits() + 1;
            let bits = bits.div_ceil(8).max(1) * 8;
            (bits <= 256).then_some((bits as u16, true))
        } else {
            let bits = magnitude.bits().div_ceil(8).max(1) * 8;
            (bits <= 256).then_some((bits as u16, false))
        }
    }

    /// Number of bits needed for the magnitude of an integer value.
    pub fn integer_bits(&self) -> usize {
        self.numerator.magnitude.bits()
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.numerator.mul_unsigned(&other.denominator);
        let right = other.numerator.mul_unsigned(&self.denominator);
        left.cmp(&right)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{} / {}", self.numerator, self.denominator)
        }
    }
}

/// Parses the source text of a number literal (`12`, `1_000`, `0x1f`, `1.5`,
/// `2e18`, `.5`, `25e-2`).
pub fn parse_number_literal(text: &str) -> Result<Rational, String> {
    if text.is_empty() {
        return Err(String::from("empty literal"));
    }
    if text.starts_with('_') || text.ends_with('_') || text.contains("__") {
        return Err(String::from("invalid use of underscores in number literal"));
    }
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();

    if let Some(digits) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        let value = BigUint::from_radix(digits, 16).ok_or_else(|| String::from("invalid hexadecimal number"))?;
        let value = Rational::integer(BigInt::new(false, value));
        return if value.exceeds_limit() {
            Err(String::from("number literal too large"))
        } else {
            Ok(value)
        };
    }

    let (mantissa, exponent) = match cleaned.find(['e', 'E']) {
        Some(index) => (&cleaned[..index], Some(&cleaned[index + 1..])),
        None => (&cleaned[..], None),
    };

    let (integer_part, fraction_part) = match mantissa.find('.') {
        Some(index) => (&mantissa[..index], &mantissa[index + 1..]),
        None => (mantissa, ""),
    };
    if integer_part.is_empty() && fraction_part.is_empty() {
        return Err(String::from("missing digits"));
    }
    if mantissa.contains('.') && fraction_part.is_empty() {
        return Err(String::from("expected digits after the decimal point"));
    }
    let digits = format!("{}{}", integer_part, fraction_part);
    let numerator = BigUint::from_radix(&digits, 10).ok_or_else(|| String::from("invalid decimal number"))?;
    let ten = BigUint::from_u64(10);
    let denominator = ten
        .pow(fraction_part.len() as u64)
        .ok_or_else(|| String::from("number literal too large"))?;
    let mut value = Rational::new(BigInt::new(false, numerator), denominator)
        .ok_or_else(|| String::from("invalid decimal number"))?;

    if let Some(exponent) = exponent {
        let (negative, exponent_digits) = match exponent.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, exponent),
        };
        let exponent: u64 = exponent_digits
            .parse()
            .map_err(|_| String::from("invalid exponent"))?;
        let scale = ten.pow(exponent).ok_or_else(|| String::from("number literal too large"))?;
        let scale = Rational::integer(BigInt::new(false, scale));
        value = if negative { value.div(&scale) } else { value.mul(&scale) }
            .ok_or_else(|| String::from("number literal too large"))?;
    }

    if value.exceeds_limit() {
        Err(String::from("number literal too large"))
    } else {
        Ok(value)
    }
}
