//! Embedded GLSL sources.
//!
//! All three stages target GLSL 4.30 core, the first version with compute
//! shaders and `imageStore`.

/// Color written by the compute placeholder to every texel.
pub const FLAT_BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// `local_size_x/y/z` declared by [`COMPUTE_SHADER`].
pub const COMPUTE_LOCAL_SIZE: [u32; 3] = [1, 1, 1];

/// Image unit the compute shader writes through.
pub const OUTPUT_IMAGE_UNIT: u32 = 0;

/// Texture unit the fragment shader samples from.
pub const SAMPLER_TEXTURE_UNIT: u32 = 0;

/// Passes the position through and derives a texture coordinate from it.
pub const VERTEX_SHADER: &str = r#"#version 430 core
layout (location = 0) in vec4 vPos;

out vec2 TexCoord;

void main()
{
    gl_Position = vec4(vPos.x, vPos.y, vPos.z, 1.0);
    TexCoord = vPos.xy + vec2(0.5);
}
"#;

/// Samples the compute output and writes it unmodified.
pub const FRAGMENT_SHADER: &str = r#"#version 430 core
out vec4 FragColor;
layout(binding = 0) uniform sampler2D colortexture;

in vec2 TexCoord;

void main()
{
    vec4 texColor = texture(colortexture, TexCoord);
    FragColor = texColor;
}
"#;

/// One invocation per texel; the body is a placeholder that writes flat blue.
pub const COMPUTE_SHADER: &str = r#"#version 430 core
layout(local_size_x = 1, local_size_y = 1) in;
layout(rgba32f, binding = 0) uniform image2D img_output;

void main() {
    // base pixel colour for image
    vec4 pixel = vec4(0.0, 0.0, 1.0, 1.0);
    // global work group index is the texel position
    ivec2 pixel_coords = ivec2(gl_GlobalInvocationID.xy);

    // placeholder: no per-pixel work yet

    imageStore(img_output, pixel_coords, pixel);
}
"#;

/// CPU counterpart of [`COMPUTE_SHADER`]'s body, indexed by global invocation id.
pub fn compute_placeholder(_global_id: [u32; 3]) -> [f32; 4] {
    FLAT_BLUE
}
