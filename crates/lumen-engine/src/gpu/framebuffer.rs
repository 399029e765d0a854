//! Framebuffer procedures.

use super::context::GpuContext;
use super::handle::{FramebufferId, TextureId};

pub fn create(gl: &mut dyn GpuContext) -> Option<FramebufferId> {
    let framebuffer = gl.create_framebuffer();
    if framebuffer.is_none() {
        log::warn!("driver refused to create a framebuffer");
    }
    framebuffer
}

pub fn bind(gl: &mut dyn GpuContext, framebuffer: FramebufferId) {
    gl.bind_framebuffer(Some(framebuffer));
}

/// Binds the window framebuffer.
pub fn unbind(gl: &mut dyn GpuContext) {
    gl.bind_framebuffer(None);
}

/// Attaches `textures` as consecutive color outputs of `framebuffer`.
///
/// The framebuffer that was bound before is bound again afterwards.
pub fn attach(gl: &mut dyn GpuContext, framebuffer: FramebufferId, textures: &[TextureId]) {
    let previous = gl.bound_framebuffer();
    gl.bind_framebuffer(Some(framebuffer));

    for (attachment, &texture) in (0u32..).zip(textures) {
        gl.framebuffer_texture(attachment, Some(texture));
    }
    if !textures.is_empty() {
        gl.draw_buffers(textures.len() as u32);
    }

    gl.bind_framebuffer(previous);
}

pub fn delete(gl: &mut dyn GpuContext, framebuffers: &[FramebufferId]) {
    for &framebuffer in framebuffers {
        gl.delete_framebuffer(framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{Call, RecordingContext};

    #[test]
    fn attach_numbers_outputs_in_order() {
        let mut gl = RecordingContext::new();
        let fbo = create(&mut gl).unwrap();
        let a = gl.create_texture().unwrap();
        let b = gl.create_texture().unwrap();
        gl.clear_calls();

        attach(&mut gl, fbo, &[a, b]);

        assert_eq!(
            gl.calls(),
            &[
                Call::BindFramebuffer(Some(fbo)),
                Call::FramebufferTexture { attachment: 0, texture: Some(a) },
                Call::FramebufferTexture { attachment: 1, texture: Some(b) },
                Call::DrawBuffers(2),
                Call::BindFramebuffer(None),
            ]
        );
    }
}
