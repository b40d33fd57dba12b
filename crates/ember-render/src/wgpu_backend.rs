//! wgpu implementation of the GPU command interface
//!
//! GL-style state (current program, enabled streams, blend) is tracked on the
//! CPU. Each draw resolves that state into a cached pipeline; `flush` encodes
//! one render pass for everything recorded since the previous flush.
//! Points are drawn as instanced quads: one instance per vertex of the bound
//! streams, four corners expanded by the vertex stage. Triangles step the
//! streams per vertex.

use crate::gpu::{
    AttributePointer, BlendFactor, BlendFunc, GpuCommands, GpuProgramService, ProgramHandle,
    UniformKind, UniformSlot, UniformValue,
};
use crate::program::{ProgramInterface, UNIFORM_BINDING};
use crate::shaders::U_VIEWPORT;
use ember_core::{EmberError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Two triangles covering a point sprite's corners
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Attachments one frame draws into
pub struct FrameTarget {
    pub color: wgpu::TextureView,
    pub depth: Option<wgpu::TextureView>,
    pub width: u32,
    pub height: u32,
}

struct UniformBlock {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// CPU copy, uploaded on flush when dirty
    data: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    fn write(&mut self, slot: UniformSlot, value: &UniformValue) -> bool {
        let bytes = value.as_bytes();
        let start = slot.offset as usize;
        let Some(dst) = self.data.get_mut(start..start + bytes.len()) else {
            return false;
        };
        if dst != bytes {
            dst.copy_from_slice(bytes);
            self.dirty = true;
        }
        true
    }
}

struct GpuProgram {
    interface: ProgramInterface,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniforms: Option<UniformBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Primitive {
    Points,
    Triangles,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: u32,
    primitive: Primitive,
    stride: u32,
    /// (location, components, offset) per enabled stream
    attributes: Vec<(u32, u32, u32)>,
    blend: Option<BlendFunc>,
}

struct PendingDraw {
    key: PipelineKey,
    first: u32,
    count: u32,
}

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,

    programs: HashMap<u32, GpuProgram>,
    next_program: u32,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    quad_indices: wgpu::Buffer,

    vertices: Option<wgpu::Buffer>,
    /// Bytes of the most recent upload
    vertex_bytes: u64,
    /// Address and length of the slice uploaded since the last flush
    uploaded: Option<(usize, usize)>,

    current: Option<u32>,
    attributes: BTreeMap<u32, AttributePointer>,
    enabled: BTreeSet<u32>,
    blend: Option<BlendFunc>,
    viewport: Option<(u32, u32)>,

    target: Option<FrameTarget>,
    clear_color: Option<[f32; 4]>,
    draws: Vec<PendingDraw>,
}

impl WgpuBackend {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let quad_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Sprite Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            device,
            queue,
            color_format,
            depth_format,
            programs: HashMap::new(),
            next_program: 0,
            pipelines: HashMap::new(),
            quad_indices,
            vertices: None,
            vertex_bytes: 0,
            uploaded: None,
            current: None,
            attributes: BTreeMap::new(),
            enabled: BTreeSet::new(),
            blend: None,
            viewport: None,
            target: None,
            clear_color: None,
            draws: Vec::new(),
        }
    }

    /// Direct subsequent flushes into `target`
    pub fn begin_frame(&mut self, target: FrameTarget) {
        self.target = Some(target);
    }

    /// Release the frame's attachments so the surface texture can be presented
    pub fn end_frame(&mut self) -> Option<FrameTarget> {
        if !self.draws.is_empty() || self.clear_color.is_some() {
            self.flush();
        }
        self.target.take()
    }

    fn program(&self, handle: ProgramHandle) -> Result<&GpuProgram> {
        self.programs
            .get(&handle.id())
            .ok_or(EmberError::UnknownProgram(handle.id()))
    }

    fn upload_vertices(&mut self, data: &[f32]) {
        let key = (data.as_ptr() as usize, data.len());
        if self.uploaded == Some(key) {
            return;
        }
        self.uploaded = Some(key);

        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.vertex_bytes = bytes.len() as u64;
        if bytes.is_empty() {
            return;
        }
        let fits = self
            .vertices
            .as_ref()
            .is_some_and(|buffer| buffer.size() >= self.vertex_bytes);
        if fits {
            if let Some(buffer) = &self.vertices {
                self.queue.write_buffer(buffer, 0, bytes);
            }
        } else {
            debug!(bytes = bytes.len(), "Allocating vertex buffer");
            self.vertices = Some(self.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Vertex Buffer"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                },
            ));
        }
    }

    /// Resolve the current state into a pipeline key for drawing `end` vertices
    fn draw_key(&self, program_id: u32, primitive: Primitive, end: u32) -> Option<PipelineKey> {
        let program = self.programs.get(&program_id)?;
        let mut stride = None;
        let mut attributes = Vec::new();

        for input in program.interface.vertex_inputs() {
            let pointer = match self.attributes.get(&input.location) {
                Some(p) if self.enabled.contains(&input.location) => *p,
                _ => {
                    warn!(location = input.location, "Vertex input has no enabled stream");
                    return None;
                }
            };
            if pointer.components != input.components {
                warn!(
                    location = input.location,
                    expected = input.components,
                    bound = pointer.components,
                    "Vertex stream has the wrong width"
                );
                return None;
            }
            match stride {
                None => stride = Some(pointer.effective_stride()),
                Some(s) if s != pointer.effective_stride() => {
                    warn!("Vertex streams disagree on stride");
                    return None;
                }
                Some(_) => {}
            }
            if pointer.bytes_needed(end) > self.vertex_bytes {
                warn!(
                    location = input.location,
                    vertices = end,
                    "Draw reads past the bound vertex data"
                );
                return None;
            }
            attributes.push((pointer.location, pointer.components, pointer.offset));
        }

        Some(PipelineKey {
            program: program_id,
            primitive,
            stride: stride.unwrap_or(0),
            attributes,
            blend: self.blend,
        })
    }

    fn queue_draw(&mut self, primitive: Primitive, first: u32, count: u32) {
        if count == 0 {
            return;
        }
        let Some(program_id) = self.current else {
            warn!(primitive = ?primitive, "Draw without a program in use");
            return;
        };
        let Some(key) = self.draw_key(program_id, primitive, first.saturating_add(count)) else {
            return;
        };
        if !self.pipelines.contains_key(&key) {
            let Some(pipeline) = self.create_pipeline(&key) else {
                return;
            };
            self.pipelines.insert(key.clone(), pipeline);
        }
        self.draws.push(PendingDraw { key, first, count });
    }

    fn create_pipeline(&self, key: &PipelineKey) -> Option<wgpu::RenderPipeline> {
        let program = self.programs.get(&key.program)?;

        let attributes: Vec<wgpu::VertexAttribute> = key
            .attributes
            .iter()
            .map(|&(location, components, offset)| wgpu::VertexAttribute {
                format: float_format(components),
                offset: offset as u64,
                shader_location: location,
            })
            .collect();
        let (label, step_mode) = match key.primitive {
            Primitive::Points => ("Point Sprite Pipeline", wgpu::VertexStepMode::Instance),
            Primitive::Triangles => ("Triangle Pipeline", wgpu::VertexStepMode::Vertex),
        };
        let buffers = if attributes.is_empty() {
            Vec::new()
        } else {
            vec![wgpu::VertexBufferLayout {
                array_stride: key.stride as u64,
                step_mode,
                attributes: &attributes,
            }]
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&program.layout),
                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(program.interface.vertex_entry.as_str()),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(program.interface.fragment_entry.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: key.blend.map(blend_state),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                // Depth testing stays off: cleared every frame, never tested or written
                depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            warn!(error = %err, primitive = ?key.primitive, "Failed to build pipeline");
            return None;
        }
        Some(pipeline)
    }
}

impl GpuProgramService for WgpuBackend {
    fn compile_and_link(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle> {
        let interface = ProgramInterface::link(vertex_source, fragment_source)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Vertex Shader"),
                source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Fragment Shader"),
                source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
            });

        let mut bind_group_layouts = Vec::new();
        let mut uniforms = None;
        if interface.uniform_block_size > 0 {
            let bind_group_layout =
                self.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        entries: &[wgpu::BindGroupLayoutEntry {
                            binding: UNIFORM_BINDING,
                            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        }],
                        label: Some("Program Uniform Bind Group Layout"),
                    });

            let data = vec![0u8; interface.uniform_block_size as usize];
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Program Uniform Buffer"),
                    contents: &data,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("Program Uniform Bind Group"),
            });

            bind_group_layouts.push(bind_group_layout);
            uniforms = Some(UniformBlock {
                buffer,
                bind_group,
                data,
                dirty: false,
            });
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Program Pipeline Layout"),
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(EmberError::ProgramLink(err.to_string()));
        }

        self.next_program += 1;
        let handle = ProgramHandle::new(self.next_program)
            .ok_or_else(|| EmberError::ProgramLink("program ids exhausted".into()))?;
        debug!(
            program = handle.id(),
            uniforms = ?interface.uniform_names().collect::<Vec<_>>(),
            "Linked program"
        );
        self.programs.insert(
            handle.id(),
            GpuProgram {
                interface,
                vertex,
                fragment,
                layout,
                uniforms,
            },
        );
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformSlot> {
        self.program(program).ok()?.interface.uniform(name)
    }

    fn release(&mut self, program: ProgramHandle) {
        let id = program.id();
        if self.programs.remove(&id).is_none() {
            return;
        }
        self.pipelines.retain(|key, _| key.program != id);
        self.draws.retain(|draw| draw.key.program != id);
        if self.current == Some(id) {
            self.current = None;
        }
        debug!(program = id, "Released program");
    }
}

impl GpuCommands for WgpuBackend {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    fn clear(&mut self, color: [f32; 4]) {
        // Draws recorded before the clear would be wiped by it
        self.draws.clear();
        self.clear_color = Some(color);
    }

    fn use_program(&mut self, program: ProgramHandle) {
        match self.program(program) {
            Ok(_) => self.current = Some(program.id()),
            Err(e) => {
                warn!(error = %e, "use_program ignored");
                self.current = None;
            }
        }
    }

    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) {
        if slot.kind != value.kind() {
            warn!(expected = ?slot.kind, got = ?value.kind(), "Uniform type mismatch");
            return;
        }
        let block = self
            .current
            .and_then(|id| self.programs.get_mut(&id))
            .and_then(|program| program.uniforms.as_mut());
        match block {
            Some(block) => {
                if !block.write(slot, &value) {
                    warn!(offset = slot.offset, "Uniform outside the program's block");
                }
            }
            None => warn!("set_uniform without a program in use"),
        }
    }

    fn bind_attribute(&mut self, pointer: AttributePointer, data: &[f32]) {
        if !(1..=4).contains(&pointer.components) {
            warn!(components = pointer.components, "Unsupported attribute width");
            return;
        }
        self.upload_vertices(data);
        self.attributes.insert(pointer.location, pointer);
    }

    fn enable_attribute(&mut self, location: u32) {
        self.enabled.insert(location);
    }

    fn set_blend(&mut self, blend: Option<BlendFunc>) {
        self.blend = blend;
    }

    fn draw_points(&mut self, first: u32, count: u32) {
        self.queue_draw(Primitive::Points, first, count);
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        // Trailing vertices that do not make a whole triangle are dropped
        self.queue_draw(Primitive::Triangles, first, count - count % 3);
    }

    fn flush(&mut self) {
        let draws = std::mem::take(&mut self.draws);
        let clear = self.clear_color.take();
        self.uploaded = None;

        let Some(target) = &self.target else {
            if !draws.is_empty() {
                warn!(draws = draws.len(), "Flush without a frame target; dropping draws");
            }
            return;
        };
        if draws.is_empty() && clear.is_none() {
            return;
        }

        let (width, height) = match self.viewport {
            Some((w, h)) if w > 0 && h > 0 => (w.min(target.width), h.min(target.height)),
            _ => (target.width, target.height),
        };

        let viewport = UniformValue::Vec2([width as f32, height as f32]);
        for program in self.programs.values_mut() {
            let Some(block) = program.uniforms.as_mut() else {
                continue;
            };
            if let Some(slot) = program.interface.uniform(U_VIEWPORT) {
                if slot.kind == UniformKind::Vec2 {
                    block.write(slot, &viewport);
                }
            }
            if block.dirty {
                self.queue.write_buffer(&block.buffer, 0, &block.data);
                block.dirty = false;
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let color_load = match clear {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = match clear {
                Some(_) => wgpu::LoadOp::Clear(1.0),
                None => wgpu::LoadOp::Load,
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: target.depth.as_ref().map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

            for draw in &draws {
                let (Some(pipeline), Some(program)) = (
                    self.pipelines.get(&draw.key),
                    self.programs.get(&draw.key.program),
                ) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                if let Some(block) = &program.uniforms {
                    pass.set_bind_group(0, &block.bind_group, &[]);
                }
                if !draw.key.attributes.is_empty() {
                    let Some(vertices) = &self.vertices else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, vertices.slice(..));
                }
                let range = draw.first..draw.first.saturating_add(draw.count);
                match draw.key.primitive {
                    Primitive::Points => {
                        pass.set_index_buffer(
                            self.quad_indices.slice(..),
                            wgpu::IndexFormat::Uint16,
                        );
                        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, range);
                    }
                    Primitive::Triangles => pass.draw(range, 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

fn blend_state(func: BlendFunc) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(func.src),
        dst_factor: blend_factor(func.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}
