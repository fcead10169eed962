use std::io::Result;

fn main() -> Result<()> {
    // The protocol definitions are owned by the client crate
    let proto_files = &[
        "../feast-client/proto/feast/serving/ServingService.proto",
        "../feast-client/proto/feast/types/Value.proto",
    ];

    // Name of the folder containing the proto definitions
    let proto_folder = "../feast-client/proto";

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
