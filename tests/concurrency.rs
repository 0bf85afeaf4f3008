//! Integration tests for resolvers shared between threads.
//!
//! The resolver, registry and cache are shared; every thread owns its sessions. All threads must
//! observe identical handles for identical names.

use std::{sync::Arc, thread};

use wiretype::prelude::*;

const THREADS: usize = 8;

fn stream_for(resolver: &TypeResolver, types: &[TypeHandle]) -> Result<Vec<u8>> {
    let mut writer = WireWriter::new();
    let mut session = SerializerSession::new();
    for ty in types {
        resolver.write_type(&mut writer, ty, &mut session, &SerializerOptions::default())?;
    }

    Ok(writer.into_inner())
}

#[test]
fn test_parallel_decoding_shares_cache() -> Result<()> {
    let registry = Arc::new(TypeRegistry::new());
    let resolver = TypeResolver::for_registry(registry.clone());

    let types = vec![
        registry.handle_of::<i32>(),
        registry.handle_of::<String>(),
        registry.array_of(&registry.handle_of::<u64>(), 1)?,
        registry.nullable_of(&registry.handle_of::<char>())?,
        registry.handle_of::<i32>(),
    ];
    let bytes = stream_for(&resolver, &types)?;

    let decoded: Vec<Vec<TypeHandle>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| -> Result<Vec<TypeHandle>> {
                    let mut reader = WireReader::new(&bytes);
                    let mut session = DeserializerSession::new();
                    (0..types.len())
                        .map(|_| resolver.read_type(&mut reader, &mut session))
                        .collect()
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().expect("decoder thread panicked"))
            .collect::<Result<Vec<_>>>()
    })?;

    for result in &decoded {
        assert_eq!(result, &types);
    }
    assert_eq!(resolver.cache().len(), 4);
    Ok(())
}

#[test]
fn test_parallel_registration_and_lookup() -> Result<()> {
    let registry = Arc::new(TypeRegistry::new());
    let resolver = TypeResolver::for_registry(registry.clone());

    let registered: Vec<TypeHandle> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|index| {
                let registry = registry.clone();
                scope.spawn(move || {
                    let assembly =
                        AssemblyIdentity::new(format!("Plugin{index}"), AssemblyVersion::new(2, 0, 0, 0));
                    TypeBuilder::new("Plugins", "Entry", assembly)
                        .field("Value", registry.handle_of::<i32>())
                        .register(&registry)
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().expect("registration thread panicked"))
            .collect::<Result<Vec<_>>>()
    })?;

    assert_eq!(registry.get_by_fullname("Plugins.Entry").len(), THREADS);

    for handle in &registered {
        let bytes = stream_for(&resolver, std::slice::from_ref(handle))?;
        let mut session = DeserializerSession::new();
        let resolved = resolver.read_type(&mut WireReader::new(&bytes), &mut session)?;
        assert_eq!(&resolved, handle);
    }
    Ok(())
}

#[test]
fn test_shared_cache_across_resolvers() -> Result<()> {
    let registry = Arc::new(TypeRegistry::new());
    let cache = Arc::new(TypeNameCache::new());
    let first = TypeResolver::new(
        registry.clone(),
        NameCompressor::for_registry(&registry),
        cache.clone(),
    );
    let second = TypeResolver::new(
        registry.clone(),
        NameCompressor::for_registry(&registry),
        cache.clone(),
    );

    let bytes = stream_for(&first, &[registry.handle_of::<bool>()])?;
    let a = first.read_type(&mut WireReader::new(&bytes), &mut DeserializerSession::new())?;
    let b = second.read_type(&mut WireReader::new(&bytes), &mut DeserializerSession::new())?;

    assert_eq!(a, b);
    assert_eq!(cache.len(), 1);
    Ok(())
}
