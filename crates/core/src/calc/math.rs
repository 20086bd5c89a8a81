use super::{CalculationError, Operation, MAX_FACTORIAL_INPUT, MAX_FIBONACCI_INPUT};

const LIMB_BASE: u32 = 1_000_000_000;

/// `n!` as a decimal string, for `0 <= n <= 20`.
pub fn factorial(n: i64) -> Result<String, CalculationError> {
    if n < 0 {
        return Err(CalculationError::InputTooSmall {
            operation: Operation::Factorial,
            input: n,
            min: 0,
        });
    }
    if n > MAX_FACTORIAL_INPUT {
        return Err(CalculationError::InputTooLarge {
            operation: Operation::Factorial,
            input: n,
            max: MAX_FACTORIAL_INPUT,
        });
    }

    let value: u64 = (1..=n as u64).product();
    Ok(value.to_string())
}

/// The `n`th Fibonacci number (`fib(0) = 0`, `fib(1) = 1`) as a decimal string.
pub fn fibonacci(n: i64) -> Result<String, CalculationError> {
    if n < 0 {
        return Err(CalculationError::InputTooSmall {
            operation: Operation::Fibonacci,
            input: n,
            min: 0,
        });
    }
    if n > MAX_FIBONACCI_INPUT {
        return Err(CalculationError::InputTooLarge {
            operation: Operation::Fibonacci,
            input: n,
            max: MAX_FIBONACCI_INPUT,
        });
    }

    // Little-endian base 10^9 limbs; fib(1000) has 209 digits.
    let mut a: Vec<u32> = vec![0];
    let mut b: Vec<u32> = vec![1];
    for _ in 0..n {
        let next = add_limbs(&a, &b);
        a = std::mem::replace(&mut b, next);
    }
    Ok(limbs_to_string(&a))
}

/// `"true"` when `n` is prime, `"false"` otherwise. Requires `n >= 2`.
pub fn prime_check(n: i64) -> Result<String, CalculationError> {
    if n < 2 {
        return Err(CalculationError::InputTooSmall {
            operation: Operation::PrimeCheck,
            input: n,
            min: 2,
        });
    }
    Ok(is_prime(n as u64).to_string())
}

fn is_prime(n: u64) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5;
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

fn add_limbs(a: &[u32], b: &[u32]) -> Vec<u32> {
    let len = a.len().max(b.len());
    let mut out = Vec::with_capacity(len + 1);
    let mut carry = 0u32;
    for i in 0..len {
        let sum = a.get(i).copied().unwrap_or(0) + b.get(i).copied().unwrap_or(0) + carry;
        out.push(sum % LIMB_BASE);
        carry = sum / LIMB_BASE;
    }
    if carry > 0 {
        out.push(carry);
    }
    out
}

fn limbs_to_string(limbs: &[u32]) -> String {
    let mut iter = limbs.iter().rev();
    let mut out = match iter.next() {
        Some(most_significant) => most_significant.to_string(),
        None => return "0".to_string(),
    };
    for limb in iter {
        out.push_str(&format!("{:09}", limb));
    }
    out
}
