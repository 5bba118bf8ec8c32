/// List GPU adapters and the strings that select them.
#[cfg(feature = "gpu")]
pub fn cmd_devices() -> Result<(), String> {
    let adapters = julia_core::gpu::list_adapters();
    if adapters.is_empty() {
        println!("No GPU adapters found");
        return Ok(());
    }

    println!("Available adapters (select with --platform <name|vendor|api>):");
    for (index, adapter) in adapters.iter().enumerate() {
        println!("  [{}] {}", index, adapter);
    }
    Ok(())
}

#[cfg(not(feature = "gpu"))]
pub fn cmd_devices() -> Result<(), String> {
    Err("This build has no GPU support (rebuild with the `gpu` feature)".to_string())
}
