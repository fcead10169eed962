use std::io::Result;

fn main() -> Result<()> {
    let proto_files = &[
        // Services
        "proto/feast/serving/ServingService.proto",
        // Messages
        "proto/feast/types/Value.proto",
    ];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";

    for file in proto_files {
        println!("cargo:rerun-if-changed={file}");
    }

    tonic_prost_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
