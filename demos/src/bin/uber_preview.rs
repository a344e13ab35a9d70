//! # Uber Preview
//!
//! Headless preview of the uber-shader pipeline on the dummy context.
//!
//! Every frame renders a shadow map of the scene with the depth-clip special
//! material, then renders a lit sphere and floor with programs from the
//! materials registry. Present tasks are executed in dependency order and the
//! context counters are logged, which shows that programs are compiled once
//! and then served from the cache.
//!
//! ```bash
//! cargo run --bin uber_preview -- --shading phong --point-lights 2 --shadows --frames 5
//! ```

use std::sync::Arc;

use clap::Parser;
use ragl_core::handle::TextureHandle;
use ragl_core::material::{Material, MaterialTexture, Shading, ShadingProperty, ShadingPropertyAttachment};
use ragl_core::math::nalgebra::Point3;
use ragl_core::math::{normal_matrix, Mat4, Vec3};
use ragl_core::mesh::generators::{generate_quad, generate_sphere, MeshData};
use ragl_core::mesh::Mesh;
use ragl_core::scene::{LightFalloff, Scene, SceneLight, SceneLightType};
use ragl_graphics::types::{
    AddressMode, BufferDescriptor, BufferUsage, ClearValue, SamplerDescriptor, TextureDescriptor,
    TextureFormat, TextureUsage, Viewport,
};
use ragl_graphics::{
    ContextTaskQueue, DummyContext, GeneralProperty, GpuContext, GraphicsError, ItemProperty,
    MaterialsConfig, MaterialsRegistry, PresentTask, PropertyValue, RenderTargets, SpecialMaterial,
    TextureBinding, UberProgram,
};

/// Shading used by the lit materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliShading {
    /// Diffuse-only lighting.
    Lambert,
    /// Diffuse plus specular lighting.
    #[default]
    Phong,
}

impl From<CliShading> for Shading {
    fn from(cli: CliShading) -> Self {
        match cli {
            CliShading::Lambert => Shading::Lambert,
            CliShading::Phong => Shading::Phong,
        }
    }
}

/// raGL uber-shader preview arguments.
#[derive(Parser, Debug)]
#[command(name = "uber_preview", about = "Render a shadowed scene through raGL uber programs", version)]
struct Args {
    /// Shading of the sphere and floor materials.
    #[arg(long, default_value = "phong", value_enum)]
    shading: CliShading,

    /// Number of point lights around the sphere.
    #[arg(long, default_value = "1")]
    point_lights: u32,

    /// Let the sun cast a shadow map.
    #[arg(long)]
    shadows: bool,

    /// Number of frames to render.
    #[arg(long, default_value = "3")]
    frames: u32,

    /// Render target width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Render target height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Shadow map size in pixels.
    #[arg(long, default_value = "1024")]
    shadow_map_size: u32,

    /// Print the composed sources of the sphere program.
    #[arg(long)]
    dump_shaders: bool,

    /// Run composed shaders through naga's validator.
    #[arg(long)]
    validation: bool,
}

/// A mesh whose vertex and index data live in context buffers.
struct UploadedMesh {
    mesh: Mesh,
    material: Arc<Material>,
    model: Mat4,
}

/// Everything the preview needs across frames.
struct AppContext {
    context: Arc<DummyContext>,
    registry: MaterialsRegistry,
    queue: ContextTaskQueue,
    scene: Scene,
    meshes: Vec<UploadedMesh>,
    color_target: TextureHandle,
    depth_target: TextureHandle,
    shadow_map: TextureHandle,
    camera: Point3<f32>,
    args: Args,
}

impl AppContext {
    fn new(args: Args) -> Result<Self, GraphicsError> {
        let mut context = DummyContext::new();
        if args.validation {
            context = context.with_validation();
        }
        let context = Arc::new(context);
        let registry = MaterialsRegistry::new(context.clone(), MaterialsConfig::default())?;
        let queue = ContextTaskQueue::new();

        let color_target = context.create_texture(
            &TextureDescriptor::new_2d(
                args.width,
                args.height,
                TextureFormat::Rgba8UnormSrgb,
                TextureUsage::RENDER_ATTACHMENT,
            )
            .with_label("color"),
        )?;
        let depth_target = context.create_texture(
            &TextureDescriptor::new_2d(
                args.width,
                args.height,
                TextureFormat::Depth24Plus,
                TextureUsage::RENDER_ATTACHMENT,
            )
            .with_label("depth"),
        )?;
        let shadow_map = context.create_texture(
            &TextureDescriptor::new_2d(
                args.shadow_map_size,
                args.shadow_map_size,
                TextureFormat::Depth32Float,
                TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            )
            .with_label("sun shadow map"),
        )?;

        let floor_texture = load_floor_texture(&context, &queue)?;
        let floor_sampler = context.create_sampler(
            &SamplerDescriptor::linear()
                .with_address_mode(AddressMode::Repeat)
                .with_label("floor"),
        )?;

        let shading = Shading::from(args.shading);
        let sphere_material = Arc::new(
            Material::new("sphere")
                .with_shading(shading)
                .with_attachment(
                    ShadingProperty::Diffuse,
                    ShadingPropertyAttachment::Vec4([0.8, 0.2, 0.1, 1.0]),
                )
                .with_attachment(ShadingProperty::Shininess, ShadingPropertyAttachment::Float(32.0))
                .with_attachment(
                    ShadingProperty::Specular,
                    ShadingPropertyAttachment::Vec4([1.0, 1.0, 1.0, 1.0]),
                ),
        );
        let floor_material = Arc::new(
            Material::new("floor")
                .with_shading(shading)
                .with_attachment(
                    ShadingProperty::Diffuse,
                    ShadingPropertyAttachment::Texture(MaterialTexture::new(
                        floor_texture,
                        floor_sampler,
                    )),
                ),
        );

        let floor_model = Mat4::new_translation(&Vec3::new(0.0, -1.0, 0.0))
            * Mat4::from_euler_angles(-std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let meshes = vec![
            upload(&context, generate_sphere(1.0, 32, 16), sphere_material, Mat4::identity())?,
            upload(&context, generate_quad(5.0, 5.0), floor_material, floor_model)?,
        ];

        Ok(Self {
            scene: build_scene(&args),
            context,
            registry,
            queue,
            meshes,
            color_target,
            depth_target,
            shadow_map,
            camera: Point3::new(0.0, 2.0, 6.0),
            args,
        })
    }

    fn aspect(&self) -> f32 {
        self.args.width as f32 / self.args.height.max(1) as f32
    }

    fn camera_view_projection(&self) -> Mat4 {
        let projection = Mat4::new_perspective(self.aspect(), std::f32::consts::FRAC_PI_4, 0.1, 100.0);
        projection * Mat4::look_at_rh(&self.camera, &Point3::origin(), &Vec3::y())
    }

    fn sun_view_projection(&self) -> Mat4 {
        let direction = self
            .scene
            .lights
            .iter()
            .find(|light| light.light_type == SceneLightType::Directional)
            .map(|light| Vec3::from(light.direction))
            .unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0));
        let eye = Point3::origin() - direction.normalize() * 10.0;
        Mat4::new_orthographic(-6.0, 6.0, -6.0, 6.0, 0.1, 30.0)
            * Mat4::look_at_rh(&eye, &Point3::origin(), &Vec3::y())
    }

    /// Render one frame and return its tasks in execution order.
    fn render_frame(&mut self, frame: u32) -> Result<Vec<PresentTask>, GraphicsError> {
        let time = frame as f32 / 60.0;
        let ran = self.queue.drain(self.context.as_ref());
        if ran > 0 {
            log::debug!("Frame {}: ran {} context tasks", frame, ran);
        }

        let mut tasks = Vec::new();
        let casts_shadows = self.args.shadows;
        if casts_shadows {
            tasks.push(self.render_shadow_map(time)?);
        }

        let view_projection = self.camera_view_projection();
        let sun_view_projection = self.sun_view_projection();
        let mut first_pass = true;
        for index in 0..self.meshes.len() {
            let material = self.meshes[index].material.clone();
            let uber = self.registry.get_uber(&material, Some(&self.scene), casts_shadows)?;
            let mut uber = uber.lock();

            uber.set_shader_general_property(
                GeneralProperty::ViewProjection,
                PropertyValue::Mat4(view_projection),
            );
            uber.set_shader_general_property(
                GeneralProperty::CameraLocation,
                PropertyValue::Vec3([self.camera.x, self.camera.y, self.camera.z]),
            );
            upload_lights(&mut uber, &self.scene, self.shadow_map, &sun_view_projection);

            let mut targets = RenderTargets::new()
                .with_color(self.color_target)
                .with_depth(self.depth_target)
                .with_viewport(Viewport::new(0.0, 0.0, self.args.width as f32, self.args.height as f32));
            if first_pass {
                targets = targets
                    .with_clear_color(ClearValue::color(0.1, 0.1, 0.15, 1.0))
                    .with_clear_depth(ClearValue::Depth(1.0));
                first_pass = false;
            }

            uber.rendering_start(&targets)?;
            for uploaded in &self.meshes {
                uber.render_mesh(
                    &uploaded.mesh,
                    &uploaded.model,
                    &normal_matrix(&uploaded.model),
                    Some(&material),
                    time,
                )?;
            }
            tasks.push(uber.rendering_stop());
        }
        Ok(tasks)
    }

    fn render_shadow_map(&mut self, time: f32) -> Result<PresentTask, GraphicsError> {
        let special = self.registry.get_special_material(SpecialMaterial::DepthClip)?;
        let mut program = special.program.lock();
        program.set_shader_general_property(
            GeneralProperty::ViewProjection,
            PropertyValue::Mat4(self.sun_view_projection()),
        );

        let size = self.args.shadow_map_size as f32;
        program.rendering_start(
            &RenderTargets::new()
                .with_depth(self.shadow_map)
                .with_viewport(Viewport::new(0.0, 0.0, size, size))
                .with_clear_depth(ClearValue::Depth(1.0)),
        )?;
        for uploaded in &self.meshes {
            program.render_mesh(
                &uploaded.mesh,
                &uploaded.model,
                &normal_matrix(&uploaded.model),
                None,
                time,
            )?;
        }
        Ok(program.rendering_stop())
    }

    fn dump_shaders(&mut self) -> Result<(), GraphicsError> {
        let material = self.meshes[0].material.clone();
        let uber = self.registry.get_uber(&material, Some(&self.scene), self.args.shadows)?;
        if let Some((vertex, fragment)) = uber.lock().sources() {
            println!("// ---- vertex ----\n{vertex}\n// ---- fragment ----\n{fragment}");
        }
        Ok(())
    }
}

/// Create the floor texture on a loader thread through the context queue.
fn load_floor_texture(
    context: &DummyContext,
    queue: &ContextTaskQueue,
) -> Result<TextureHandle, GraphicsError> {
    let poster = queue.poster();
    let loader = std::thread::spawn(move || {
        let descriptor = TextureDescriptor::new_2d(
            256,
            256,
            TextureFormat::Rgba8UnormSrgb,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )
        .with_label("floor checker");
        poster.post_and_wait(move |context| context.create_texture(&descriptor))
    });
    while !loader.is_finished() {
        queue.drain(context);
        std::thread::yield_now();
    }
    // Pick up a task posted right before the loader finished.
    queue.drain(context);
    loader
        .join()
        .map_err(|_| GraphicsError::Internal("texture loader panicked".into()))??
}

fn upload(
    context: &DummyContext,
    data: MeshData,
    material: Arc<Material>,
    model: Mat4,
) -> Result<UploadedMesh, GraphicsError> {
    let vertices = context.create_buffer(
        &BufferDescriptor::new(data.vertex_bytes().len() as u64, BufferUsage::VERTEX | BufferUsage::COPY_DST)
            .with_label(format!("{} vertices", data.label())),
    )?;
    context.write_buffer(vertices, 0, data.vertex_bytes())?;
    let indices = context.create_buffer(
        &BufferDescriptor::new(data.index_bytes().len() as u64, BufferUsage::INDEX | BufferUsage::COPY_DST)
            .with_label(format!("{} indices", data.label())),
    )?;
    context.write_buffer(indices, 0, data.index_bytes())?;

    log::info!(
        "Uploaded '{}': {} vertices, {} indices",
        data.label(),
        data.vertex_count(),
        data.index_count()
    );
    Ok(UploadedMesh {
        mesh: data.build_mesh(vertices, indices, material.clone()),
        material,
        model,
    })
}

fn build_scene(args: &Args) -> Scene {
    let mut scene = Scene::new("preview")
        .with_light(SceneLight::new("sky", SceneLightType::Ambient).with_ambient_color([0.15, 0.15, 0.2]))
        .with_light(
            SceneLight::new("sun", SceneLightType::Directional)
                .with_direction([-0.4, -1.0, -0.3])
                .with_diffuse([1.0, 0.95, 0.8])
                .with_shadow_map(true),
        )
        .with_shadow_mapping(args.shadows);

    for index in 0..args.point_lights {
        let angle = index as f32 / args.point_lights as f32 * std::f32::consts::TAU;
        scene = scene.with_light(
            SceneLight::new(format!("lamp {index}"), SceneLightType::Point)
                .with_position([3.0 * angle.cos(), 1.5, 3.0 * angle.sin()])
                .with_diffuse([0.6, 0.6, 1.0])
                .with_range(8.0)
                .with_falloff(LightFalloff::Linear),
        );
    }
    scene
}

/// Write scene light values into the matching items of `uber`.
///
/// Items are created in scene light order, so item `i` is light `i`.
fn upload_lights(
    uber: &mut UberProgram,
    scene: &Scene,
    shadow_map: TextureHandle,
    sun_view_projection: &Mat4,
) {
    for (index, light) in scene.lights.iter().enumerate().take(uber.item_count()) {
        uber.set_shader_item_property(index, ItemProperty::AmbientColor, PropertyValue::Vec3(light.ambient_color));
        uber.set_shader_item_property(index, ItemProperty::Diffuse, PropertyValue::Vec3(light.diffuse));
        uber.set_shader_item_property(index, ItemProperty::Direction, PropertyValue::Vec3(light.direction));
        uber.set_shader_item_property(index, ItemProperty::Location, PropertyValue::Vec3(light.position));
        uber.set_shader_item_property(index, ItemProperty::Attenuations, PropertyValue::Vec3(light.attenuations));
        uber.set_shader_item_property(index, ItemProperty::Range, PropertyValue::Float(light.range));
        uber.set_shader_item_property(index, ItemProperty::ConeAngle, PropertyValue::Float(light.cone_angle));
        uber.set_shader_item_property(index, ItemProperty::EdgeAngle, PropertyValue::Float(light.edge_angle));

        if uber.item(index).light().is_some_and(|desc| desc.is_shadow_caster) {
            uber.set_shader_item_property(
                index,
                ItemProperty::ShadowMapDepth,
                PropertyValue::Texture(TextureBinding {
                    texture: shadow_map,
                    sampler: None,
                }),
            );
            uber.set_shader_item_property(
                index,
                ItemProperty::DepthViewProjection,
                PropertyValue::Mat4(*sun_view_projection),
            );
        }
    }
}

fn main() -> Result<(), GraphicsError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    ragl_core::init();
    ragl_graphics::init();

    let args = Args::parse();
    log::info!("Starting uber preview: {:?}", args);
    let mut app = AppContext::new(args)?;

    if app.args.dump_shaders {
        app.dump_shaders()?;
    }

    for frame in 0..app.args.frames {
        let tasks = app.render_frame(frame)?;
        if let (Some(first), Some(last)) = (tasks.first(), tasks.last()) {
            if app.args.shadows && !last.depends_on(first) {
                log::warn!("Main pass does not read the shadow map");
            }
        }
        for task in &tasks {
            task.execute(app.context.as_ref())?;
        }

        let stats = app.context.stats();
        log::info!(
            "Frame {}: {} tasks, {} draws, {} programs linked, {} cached uber programs",
            frame,
            tasks.len(),
            stats.draws,
            stats.program_links,
            app.registry.len()
        );
    }

    log::info!("Done, {} live GPU objects", app.context.live_object_count());
    Ok(())
}
