use std::io::Result;

fn main() -> Result<()> {
    let proto_files = &["proto/sync/entities.proto", "proto/sync/protocol.proto"];

    tonic_prost_build::configure().compile_protos(proto_files, &["proto"])?;

    Ok(())
}
