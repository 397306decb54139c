use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::render_loop::{FrameParams, SceneRenderer};
use crate::scroll::CAMERA_REST_Y;

const VERT_SRC: &str = r#"#version 300 es
const vec2 P[3] = vec2[3](vec2(-1.0, -1.0), vec2(3.0, -1.0), vec2(-1.0, 3.0));
out vec2 vUv;
void main() {
    vec2 p = P[gl_VertexID];
    vUv = p * 0.5 + 0.5;
    gl_Position = vec4(p, 0.0, 1.0);
}
"#;

const FRAG_SRC: &str = r#"#version 300 es
precision highp float;

uniform vec2 uResolution;
uniform float uTime;
uniform float uHope;
uniform float uExposure;
uniform float uBloomStrength;
uniform float uBloomThreshold;
uniform float uEnvIntensity;
uniform vec2 uCameraOffset;
uniform float uRainOpacity;
uniform float uRainFalling;
uniform float uFogAlpha;
uniform vec3 uFogColor;
uniform vec3 uWaterColor;
uniform float uWaveAmp;
uniform vec3 uPierColor;
uniform float uGodRayAlpha;
uniform float uParticleAlpha;
uniform vec3 uGlowColor;

in vec2 vUv;
out vec4 outColor;

float hash(vec2 p) {
    return fract(sin(dot(p, vec2(127.1, 311.7))) * 43758.5453);
}

void main() {
    // camera sway shifts the view; the sky moves less than the water
    vec2 uv = vUv + uCameraOffset * vec2(0.04, 0.06);
    float ambient = 0.4 + 0.6 * uEnvIntensity;
    float aspect = uResolution.x / max(uResolution.y, 1.0);
    vec3 color = vec3(0.0);
    float alpha = 0.0;

    // water below the horizon
    float horizon = 0.38 + sin(uv.x * 12.0 + uTime * mix(2.0, 0.5, uHope)) * 0.01 * uWaveAmp;
    if (uv.y < horizon) {
        float depth = (horizon - uv.y) / horizon;
        float ripple = sin(uv.x * 40.0 * aspect + uTime * 1.5) * cos(uv.y * 90.0 - uTime);
        color = uWaterColor * (0.6 + 0.4 * depth) * ambient + vec3(ripple * 0.03 * uWaveAmp);
        alpha = 1.0;
    }

    // pier running to the horizon
    float pierHalf = mix(0.12, 0.01, clamp(uv.y / horizon, 0.0, 1.0));
    if (uv.y < horizon && abs(uv.x - 0.5) < pierHalf) {
        color = uPierColor * ambient;
        alpha = 1.0;
    }

    // god-rays fanning down from the top
    vec2 src = vec2(0.5, 1.15);
    vec2 d = uv - src;
    float ang = atan(d.x * aspect, -d.y);
    float rays = pow(max(0.0, sin(ang * 9.0 + uTime * 0.2)), 4.0);
    float fall = pow(clamp(1.0 - length(d), 0.0, 1.0), 1.5);
    float shimmer = sin(uv.y * 20.0 - uTime * 2.0) * 0.1 + 0.9;
    float ray = rays * fall * shimmer * uGodRayAlpha;
    color += uGlowColor * ray;
    alpha = max(alpha, ray);

    // floating light particles
    vec2 cell = floor(uv * vec2(24.0 * aspect, 24.0));
    vec2 local = fract(uv * vec2(24.0 * aspect, 24.0)) - 0.5;
    float seed = hash(cell);
    vec2 drift = vec2(sin(uTime * 0.3 + seed * 5.0), sin(uTime * (0.5 + seed * 0.3) + seed * 10.0)) * 0.3;
    float glow = pow(1.0 - smoothstep(0.0, 0.25, length(local - drift)), 2.0);
    float spark = glow * step(0.85, seed) * uParticleAlpha;
    color += mix(uGlowColor, vec3(1.0, 1.0, 0.9), glow * 0.5) * spark;
    alpha = max(alpha, spark);

    // rain streaks
    float fallT = uTime * uRainFalling;
    vec2 rp = vec2(uv.x * 160.0 * aspect, uv.y * 6.0 + fallT * 4.0);
    float streak = step(0.97, hash(floor(rp))) * smoothstep(0.0, 0.5, fract(rp.y));
    float rain = streak * uRainOpacity * 0.7;
    color = mix(color, vec3(0.67), rain);
    alpha = max(alpha, rain);

    // fog band over the horizon
    float fogBand = exp(-pow((uv.y - horizon) * 5.0, 2.0));
    float fogA = fogBand * uFogAlpha * (0.9 + sin(uTime * 0.3 + uv.x * 10.0) * 0.1);
    color = mix(color, uFogColor, fogA);
    alpha = max(alpha, fogA);

    // single-pass bloom approximation then tone mapping
    vec3 bright = max(color - vec3(uBloomThreshold), 0.0);
    color += bright * uBloomStrength;
    color *= uExposure;
    color = clamp((color * (2.51 * color + 0.03)) / (color * (2.43 * color + 0.59) + 0.14), 0.0, 1.0);

    outColor = vec4(color * alpha, alpha);
}
"#;

struct Uniforms {
    resolution: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    hope: Option<WebGlUniformLocation>,
    exposure: Option<WebGlUniformLocation>,
    bloom_strength: Option<WebGlUniformLocation>,
    bloom_threshold: Option<WebGlUniformLocation>,
    env_intensity: Option<WebGlUniformLocation>,
    camera_offset: Option<WebGlUniformLocation>,
    rain_opacity: Option<WebGlUniformLocation>,
    rain_falling: Option<WebGlUniformLocation>,
    fog_alpha: Option<WebGlUniformLocation>,
    fog_color: Option<WebGlUniformLocation>,
    water_color: Option<WebGlUniformLocation>,
    wave_amp: Option<WebGlUniformLocation>,
    pier_color: Option<WebGlUniformLocation>,
    god_ray_alpha: Option<WebGlUniformLocation>,
    particle_alpha: Option<WebGlUniformLocation>,
    glow_color: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        let loc = |name: &str| gl.get_uniform_location(program, name);
        Self {
            resolution: loc("uResolution"),
            time: loc("uTime"),
            hope: loc("uHope"),
            exposure: loc("uExposure"),
            bloom_strength: loc("uBloomStrength"),
            bloom_threshold: loc("uBloomThreshold"),
            env_intensity: loc("uEnvIntensity"),
            camera_offset: loc("uCameraOffset"),
            rain_opacity: loc("uRainOpacity"),
            rain_falling: loc("uRainFalling"),
            fog_alpha: loc("uFogAlpha"),
            fog_color: loc("uFogColor"),
            water_color: loc("uWaterColor"),
            wave_amp: loc("uWaveAmp"),
            pier_color: loc("uPierColor"),
            god_ray_alpha: loc("uGodRayAlpha"),
            particle_alpha: loc("uParticleAlpha"),
            glow_color: loc("uGlowColor"),
        }
    }
}

/// Full-screen shader pass over a transparent canvas.
pub struct GlRenderer {
    gl: GL,
    canvas: HtmlCanvasElement,
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    uniforms: Uniforms,
}

impl GlRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let gl: GL = canvas
            .get_context("webgl2")?
            .ok_or("WebGL2 not supported")?
            .dyn_into()?;

        let program = load_program(&gl, VERT_SRC, FRAG_SRC)?;
        let vao = gl
            .create_vertex_array()
            .ok_or("failed to create vertex array")?;
        let uniforms = Uniforms::locate(&gl, &program);

        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.enable(GL::BLEND);
        gl.blend_func(GL::ONE, GL::ONE_MINUS_SRC_ALPHA);

        Ok(Self {
            gl,
            canvas,
            program,
            vao,
            uniforms,
        })
    }

    /// Match the drawing buffer to the window, capping the pixel ratio at 2.
    pub fn resize(&self, css_width: f64, css_height: f64, pixel_ratio: f64) {
        let ratio = pixel_ratio.clamp(1.0, 2.0);
        let w = (css_width * ratio).max(1.0) as u32;
        let h = (css_height * ratio).max(1.0) as u32;
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        self.gl.viewport(0, 0, w as i32, h as i32);
    }

    fn set3(&self, loc: &Option<WebGlUniformLocation>, v: [f32; 3]) {
        self.gl.uniform3f(loc.as_ref(), v[0], v[1], v[2]);
    }
}

impl SceneRenderer for GlRenderer {
    fn set_exposure(&mut self, exposure: f32) {
        self.gl.use_program(Some(&self.program));
        self.gl.uniform1f(self.uniforms.exposure.as_ref(), exposure);
    }

    fn set_bloom(&mut self, strength: f32, threshold: f32) {
        self.gl.use_program(Some(&self.program));
        self.gl.uniform1f(self.uniforms.bloom_strength.as_ref(), strength);
        self.gl.uniform1f(self.uniforms.bloom_threshold.as_ref(), threshold);
    }

    fn set_environment(&mut self, intensity: f32) {
        self.gl.use_program(Some(&self.program));
        self.gl.uniform1f(self.uniforms.env_intensity.as_ref(), intensity);
    }

    fn apply_frame(&mut self, frame: &FrameParams) {
        let u = &self.uniforms;
        let v = &frame.visuals;
        let gl = &self.gl;
        gl.use_program(Some(&self.program));
        gl.uniform2f(
            u.resolution.as_ref(),
            self.canvas.width() as f32,
            self.canvas.height() as f32,
        );
        gl.uniform1f(u.time.as_ref(), frame.time);
        gl.uniform1f(u.hope.as_ref(), frame.hope);
        let (cam_x, cam_y) = frame.camera;
        gl.uniform2f(u.camera_offset.as_ref(), cam_x, cam_y - CAMERA_REST_Y);
        gl.uniform1f(u.rain_opacity.as_ref(), v.rain_opacity);
        gl.uniform1f(u.rain_falling.as_ref(), if v.rain_falling { 1.0 } else { 0.0 });
        gl.uniform1f(u.fog_alpha.as_ref(), v.fog_alpha);
        gl.uniform1f(u.wave_amp.as_ref(), v.wave_amplitude);
        gl.uniform1f(u.god_ray_alpha.as_ref(), v.god_ray_alpha);
        gl.uniform1f(u.particle_alpha.as_ref(), v.particle_alpha);
        self.set3(&u.fog_color, v.fog_color.to_array());
        self.set3(&u.water_color, v.water_color.to_array());
        self.set3(&u.pier_color, v.pier_color.to_array());
        self.set3(&u.glow_color, v.glow_color.to_array());
    }

    fn render(&mut self) {
        let gl = &self.gl;
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.use_program(Some(&self.program));
        gl.bind_vertex_array(Some(&self.vao));
        gl.draw_arrays(GL::TRIANGLES, 0, 3);
        gl.bind_vertex_array(None);
    }
}

fn compile_shader(gl: &GL, shader_type: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(shader_type)
        .ok_or("failed to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !ok {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        return Err(format!("shader compilation failed: {info}").into());
    }
    Ok(shader)
}

fn load_program(gl: &GL, vert_src: &str, frag_src: &str) -> Result<WebGlProgram, JsValue> {
    let vs = compile_shader(gl, GL::VERTEX_SHADER, vert_src)?;
    let fs = compile_shader(gl, GL::FRAGMENT_SHADER, frag_src)?;
    let program = gl.create_program().ok_or("failed to create program")?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);

    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));
    if !ok {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        return Err(format!("program linking failed: {info}").into());
    }
    Ok(program)
}
