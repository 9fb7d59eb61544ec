//! Prompt helpers for LLM-backed brains.

use sha2::{Digest, Sha256};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres el asistente de ventas de un negocio por WhatsApp. \
Responde en español, de forma breve y amable. Cuando el cliente elija un producto, \
responde con un bloque JSON con los campos \"nombre\", \"tamano\", \"precio\", \
\"descripcion\", \"foto\" y \"mensaje\".";

/// Compute a stable SHA-256 fingerprint for a prompt string.
///
/// Logged at startup so prompt changes can be correlated with behaviour.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}
