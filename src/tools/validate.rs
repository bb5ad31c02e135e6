//! Target and argument validation
//!
//! Pure computation: a request either becomes a `SanitizedCommand` or
//! dies here with a terminal error. Nothing in this module spawns a
//! process or touches the filesystem.
//!
//! Target authorization is address-family-aware arithmetic over
//! `Ipv4Addr`, never string pattern matching, so adjacent public blocks
//! (e.g. 172.32.0.0) cannot slip through.

use crate::errors::{BrokerError, Result};
use crate::tools::descriptor::ToolDescriptor;
use crate::tools::types::{SanitizedCommand, ToolRequest};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Shell metacharacters rejected anywhere in a token
const DENIED_CHARS: &[char] = &[';', '&', '|', '`', '$', '>', '<', '\n'];

/// Punctuation admitted alongside alphanumerics in argument tokens
const SAFE_PUNCTUATION: &[char] = &['-', '_', '.', '/', ':', ',', '=', '@', '+', '%'];

/// The private IPv4 blocks that bound authorized targets
const PRIVATE_BLOCKS: &[(Ipv4Addr, u8)] = &[
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
];

/// Deployment policy consulted by the target gate.
#[derive(Debug, Clone)]
pub struct TargetPolicy {
    /// Hostnames/URLs are authorized only under this domain suffix
    pub lab_suffix: String,

    /// Upper bound on the raw `extra_arguments` byte length
    pub max_arguments_len: usize,
}

impl Default for TargetPolicy {
    fn default() -> Self {
        Self {
            lab_suffix: "lab.internal".to_string(),
            max_arguments_len: 1024,
        }
    }
}

/// Validate a request against its descriptor, producing the argv that
/// will actually run: mandatory prefix arguments, sanitized extra
/// tokens, then the target.
pub fn validate(
    descriptor: &ToolDescriptor,
    request: &ToolRequest,
    policy: &TargetPolicy,
) -> Result<SanitizedCommand> {
    check_target(&request.target, policy)?;
    let tokens = check_arguments(descriptor, &request.extra_arguments, policy)?;

    let mut argv = descriptor.mandatory_prefix_arguments.clone();
    argv.extend(tokens);
    argv.push(request.target.clone());

    Ok(SanitizedCommand {
        program: descriptor.executable_name.clone(),
        argv,
    })
}

/// Authorize a target: private IPv4 address, private IPv4 CIDR, or a
/// host under the lab domain suffix.
pub fn check_target(target: &str, policy: &TargetPolicy) -> Result<()> {
    let unauthorized = || BrokerError::UnauthorizedTarget {
        target: target.to_string(),
    };

    if target.is_empty() || target.chars().any(|c| DENIED_CHARS.contains(&c) || c.is_whitespace())
    {
        return Err(unauthorized());
    }

    // Bare IPv4 address
    if let Ok(addr) = target.parse::<Ipv4Addr>() {
        return if is_private_ipv4(addr) {
            Ok(())
        } else {
            Err(unauthorized())
        };
    }

    // IPv6 is outside the authorized set entirely
    if target.parse::<Ipv6Addr>().is_ok() {
        return Err(unauthorized());
    }

    // IPv4 CIDR network
    if let Some((addr_part, len_part)) = target.split_once('/') {
        let addr = addr_part.parse::<Ipv4Addr>().map_err(|_| unauthorized())?;
        let prefix_len: u8 = len_part.parse().map_err(|_| unauthorized())?;
        return if cidr_within_private(addr, prefix_len) {
            Ok(())
        } else {
            Err(unauthorized())
        };
    }

    // Hostname or URL: authorize on the host part
    let host = extract_host(target);
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return if is_private_ipv4(addr) {
            Ok(())
        } else {
            Err(unauthorized())
        };
    }

    let suffix = policy.lab_suffix.as_str();
    if !suffix.is_empty()
        && (host == suffix || host.ends_with(&format!(".{}", suffix)))
    {
        Ok(())
    } else {
        Err(unauthorized())
    }
}

/// True iff the address falls in 10/8, 172.16/12, or 192.168/16.
fn is_private_ipv4(addr: Ipv4Addr) -> bool {
    PRIVATE_BLOCKS
        .iter()
        .any(|&(base, bits)| in_block(addr, base, bits))
}

/// True iff the entire `addr/prefix_len` range sits inside one private
/// block: the prefix must be at least as narrow as the block and the
/// address must land in it.
fn cidr_within_private(addr: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len > 32 {
        return false;
    }
    PRIVATE_BLOCKS
        .iter()
        .any(|&(base, bits)| prefix_len >= bits && in_block(addr, base, bits))
}

fn in_block(addr: Ipv4Addr, base: Ipv4Addr, bits: u8) -> bool {
    let mask: u32 = if bits == 0 { 0 } else { u32::MAX << (32 - bits) };
    (u32::from(addr) & mask) == (u32::from(base) & mask)
}

/// Pull the host out of a hostname/URL target: drop scheme, path, and
/// port.
fn extract_host(target: &str) -> &str {
    let rest = match target.find("://") {
        Some(idx) => &target[idx + 3..],
        None => target,
    };
    let rest = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    match rest.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => host,
        _ => rest,
    }
}

/// Tokenize and sanitize the raw extra arguments.
fn check_arguments(
    descriptor: &ToolDescriptor,
    raw: &str,
    policy: &TargetPolicy,
) -> Result<Vec<String>> {
    if raw.len() > policy.max_arguments_len {
        return Err(BrokerError::DisallowedArgument {
            token: String::new(),
            reason: format!(
                "arguments exceed {} bytes ({})",
                policy.max_arguments_len,
                raw.len()
            ),
        });
    }

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Shell-word splitting semantics without ever touching a shell
    let tokens = shlex::split(raw).ok_or_else(|| BrokerError::DisallowedArgument {
        token: raw.to_string(),
        reason: "unbalanced quoting".to_string(),
    })?;

    for token in &tokens {
        if let Some(bad) = token.chars().find(|c| DENIED_CHARS.contains(c)) {
            return Err(BrokerError::DisallowedArgument {
                token: token.clone(),
                reason: format!("shell metacharacter {:?}", bad),
            });
        }

        if let Some(bad) = token
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !SAFE_PUNCTUATION.contains(c))
        {
            return Err(BrokerError::DisallowedArgument {
                token: token.clone(),
                reason: format!("character {:?} outside the allowed set", bad),
            });
        }

        if token.starts_with('-') && !descriptor.flag_allowed(token) {
            return Err(BrokerError::DisallowedFlag {
                flag: token.clone(),
            });
        }
    }

    Ok(tokens)
}
